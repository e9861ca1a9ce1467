use serde::Serialize;

pub const PER_PAGE: i64 = 5;

/// Page metadata attached to paginated list payloads. Requested numbers out
/// of range are clamped rather than rejected.
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageMeta {
    pub fn new(count: i64, requested: i64) -> PageMeta {
        let num_pages = ((count + PER_PAGE - 1) / PER_PAGE).max(1);
        let number = requested.clamp(1, num_pages);
        PageMeta {
            number,
            num_pages,
            count,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }

    pub fn limit(&self) -> i64 {
        PER_PAGE
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PER_PAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_set_still_has_one_page() {
        let meta = PageMeta::new(0, 1);
        assert_eq!(meta.num_pages, 1);
        assert_eq!(meta.number, 1);
        assert!(!meta.has_previous);
        assert!(!meta.has_next);
    }

    #[test]
    fn page_numbers_clamp_to_the_valid_range() {
        let meta = PageMeta::new(12, 99);
        assert_eq!(meta.num_pages, 3);
        assert_eq!(meta.number, 3);
        assert!(meta.has_previous);
        assert!(!meta.has_next);

        let meta = PageMeta::new(12, 0);
        assert_eq!(meta.number, 1);
    }

    #[test]
    fn offsets_follow_the_page_number() {
        let meta = PageMeta::new(12, 2);
        assert_eq!(meta.offset(), PER_PAGE);
        assert_eq!(meta.limit(), PER_PAGE);
        assert!(meta.has_previous);
        assert!(meta.has_next);
    }
}
