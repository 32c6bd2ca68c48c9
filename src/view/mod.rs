// file: src/view/mod.rs
// description: result presentation module exports
// reference: internal module structure

pub mod result_view;

pub use result_view::{
    CELL_DISPLAY_LIMIT, DEFAULT_PAGE_SIZE, DEFAULT_REPORT_SUFFIX, ResultView, download_report,
    report_file_name,
};
