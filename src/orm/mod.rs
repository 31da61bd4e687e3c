pub mod categories;
pub mod category_segments;
pub mod review_flags;
pub mod review_segments;
pub mod reviews;
