// file: src/view/result_view.rs
// description: searchable, paginated projection of a result set and its download
// reference: read-only view over the orchestrator's terminal result

use crate::error::Result;
use crate::gateway::Gateway;
use crate::models::ResultSet;
use crate::models::result_set::{Row, display_text, search_text};
use crate::utils::validation::Validator;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const CELL_DISPLAY_LIMIT: usize = 50;
pub const DEFAULT_REPORT_SUFFIX: &str = "_report";
const PAGE_WINDOW: usize = 5;

/// Filters rows whose any cell contains the search term (case-insensitive)
/// and pages through them. Holding no result is valid and renders nothing.
#[derive(Debug, Clone)]
pub struct ResultView<'a> {
    result: Option<&'a ResultSet>,
    page_size: usize,
    current_page: usize,
    search_term: String,
    filtered: Vec<&'a Row>,
}

impl<'a> ResultView<'a> {
    pub fn new(result: Option<&'a ResultSet>) -> Self {
        Self::with_page_size(result, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(result: Option<&'a ResultSet>, page_size: usize) -> Self {
        let mut view = Self {
            result,
            page_size: page_size.max(1),
            current_page: 1,
            search_term: String::new(),
            filtered: Vec::new(),
        };
        view.refilter();
        view
    }

    pub fn result(&self) -> Option<&'a ResultSet> {
        self.result
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changing the term always returns to page 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
        self.refilter();
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size)
    }

    /// Clamps into `[1, total_pages]`; with no pages the view stays on 1.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.current_page = page.min(self.total_pages()).max(1);
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> usize {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn page_rows(&self) -> &[&'a Row] {
        let start = self.start_index().min(self.filtered.len());
        let end = (start + self.page_size).min(self.filtered.len());
        &self.filtered[start..end]
    }

    /// Page numbers offered for direct navigation: at most five, kept
    /// around the current page.
    pub fn page_window(&self) -> Vec<usize> {
        let total = self.total_pages();
        let len = total.min(PAGE_WINDOW);
        let first = if total <= PAGE_WINDOW || self.current_page <= 3 {
            1
        } else if self.current_page + 2 >= total {
            total + 1 - PAGE_WINDOW
        } else {
            self.current_page - 2
        };
        (first..first + len).collect()
    }

    /// `(first, last, of)` for the rows shown, 1-based.
    pub fn showing_range(&self) -> Option<(usize, usize, usize)> {
        let rows = self.page_rows();
        if rows.is_empty() {
            return None;
        }
        let first = self.start_index() + 1;
        Some((first, first + rows.len() - 1, self.filtered.len()))
    }

    pub fn header_line(&self) -> Option<String> {
        self.result.map(|result| {
            format!(
                "{} rows • {} columns",
                result.total_rows(),
                result.columns().len()
            )
        })
    }

    /// Plain-text table of the current page, or `None` without a result.
    pub fn render(&self, colored: bool) -> Option<String> {
        let result = self.result?;
        let columns = result.columns();

        let cells: Vec<Vec<String>> = self
            .page_rows()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| Validator::truncate_text(&display_text(row.get(c)), CELL_DISPLAY_LIMIT))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut output = String::new();
        if let Some(header) = self.header_line() {
            output.push_str(&header);
            output.push('\n');
        }

        let header_row = join_padded(columns, &widths);
        if colored {
            output.push_str(&header_row.bold().to_string());
        } else {
            output.push_str(&header_row);
        }
        output.push('\n');
        output.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        output.push('\n');

        if cells.is_empty() {
            let message = if self.search_term.is_empty() {
                "No data available"
            } else {
                "No results found"
            };
            output.push_str(message);
            output.push('\n');
        } else {
            for row in &cells {
                output.push_str(&join_padded(row, &widths));
                output.push('\n');
            }
        }

        if self.total_pages() > 1 {
            if let Some((first, last, of)) = self.showing_range() {
                output.push_str(&format!("Showing {} to {} of {} results", first, last, of));
                if !self.search_term.is_empty() {
                    output.push_str(&format!(" (filtered from {} total)", result.total_rows()));
                }
                output.push('\n');
            }

            let pages: Vec<String> = self
                .page_window()
                .into_iter()
                .map(|p| {
                    if p == self.current_page {
                        format!("[{}]", p)
                    } else {
                        p.to_string()
                    }
                })
                .collect();
            output.push_str(&format!(
                "Page {}/{}: {}\n",
                self.current_page,
                self.total_pages(),
                pages.join(" ")
            ));
        }

        Some(output)
    }

    /// Fetches the cleaned file and saves it as `<file_id><suffix>.csv`
    /// under `dir`. Does nothing without a result.
    pub async fn download<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        dir: &Path,
        suffix: &str,
    ) -> Result<Option<PathBuf>> {
        let Some(result) = self.result else {
            return Ok(None);
        };
        let path = download_report(gateway, result.file_id(), dir, suffix).await?;
        Ok(Some(path))
    }

    fn start_index(&self) -> usize {
        (self.current_page - 1) * self.page_size
    }

    fn refilter(&mut self) {
        let Some(result) = self.result else {
            self.filtered.clear();
            return;
        };

        let needle = self.search_term.to_lowercase();
        self.filtered = result
            .rows()
            .iter()
            .filter(|row| {
                needle.is_empty()
                    || row
                        .values()
                        .any(|value| search_text(value).to_lowercase().contains(&needle))
            })
            .collect();
    }
}

fn join_padded(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", value, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn report_file_name(file_id: &str, suffix: &str) -> String {
    format!("{}{}.csv", file_id, suffix)
}

/// Downloads the cleaned CSV for `file_id` into `dir`.
pub async fn download_report<G: Gateway + ?Sized>(
    gateway: &G,
    file_id: &str,
    dir: &Path,
    suffix: &str,
) -> Result<PathBuf> {
    Validator::validate_file_id(file_id)?;
    let bytes = gateway.download(file_id).await?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(report_file_name(file_id, suffix));
    tokio::fs::write(&path, &bytes).await?;

    info!(
        "Saved {} ({}) to {}",
        file_id,
        Validator::format_bytes(bytes.len() as u64),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::gateway::MockGateway;
    use crate::models::FileHandle;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn result_set(rows: usize) -> ResultSet {
        let data = (1..=rows)
            .map(|i| {
                let city = if i % 2 == 0 { "Recife" } else { "Natal" };
                json!({"id": i, "name": format!("Person {}", i), "city": city})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect();
        ResultSet::new(
            "abc123".to_string(),
            data,
            vec!["id".into(), "name".into(), "city".into()],
            rows as u64,
        )
        .unwrap()
    }

    fn ids(view: &ResultView<'_>) -> Vec<u64> {
        view.page_rows()
            .iter()
            .map(|row| row["id"].as_u64().unwrap())
            .collect()
    }

    #[test]
    fn test_last_page_holds_remainder() {
        let set = result_set(23);
        let mut view = ResultView::new(Some(&set));
        assert_eq!(view.total_pages(), 3);

        view.go_to_page(3);
        assert_eq!(ids(&view), vec![21, 22, 23]);
        assert_eq!(view.showing_range(), Some((21, 23, 23)));
    }

    #[test]
    fn test_go_to_page_clamps() {
        let set = result_set(23);
        let mut view = ResultView::new(Some(&set));
        assert_eq!(view.go_to_page(99), 3);
        assert_eq!(view.go_to_page(0), 1);
        assert_eq!(view.previous_page(), 1);
        view.go_to_page(3);
        assert_eq!(view.next_page(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_and_resets_page() {
        let set = result_set(23);
        let mut view = ResultView::new(Some(&set));
        view.go_to_page(2);

        view.set_search("RECIFE");
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.filtered_count(), 11);
        assert_eq!(view.total_pages(), 2);
        assert_eq!(ids(&view)[0], 2);

        view.set_search("person 7");
        assert_eq!(ids(&view), vec![7]);
    }

    #[test]
    fn test_search_matches_numbers() {
        let set = result_set(23);
        let mut view = ResultView::new(Some(&set));
        view.set_search("2");
        assert_eq!(view.filtered_count(), 6); // 2, 12, 20, 21, 22, 23
    }

    #[test]
    fn test_search_matches_integral_floats_without_fraction() {
        let data = vec![
            json!({"amount": 2.0}).as_object().cloned().unwrap(),
            json!({"amount": 2.5}).as_object().cloned().unwrap(),
        ];
        let set = ResultSet::new("f".into(), data, vec!["amount".into()], 2).unwrap();
        let mut view = ResultView::new(Some(&set));

        view.set_search("2.0");
        assert_eq!(view.filtered_count(), 0);

        view.set_search("2");
        assert_eq!(view.filtered_count(), 2);
    }

    #[test]
    fn test_search_without_matches() {
        let set = result_set(23);
        let mut view = ResultView::new(Some(&set));
        view.set_search("no such value");
        assert_eq!(view.total_pages(), 0);
        assert!(view.page_rows().is_empty());
        assert_eq!(view.go_to_page(5), 1);
        assert_eq!(view.showing_range(), None);
        assert!(view.render(false).unwrap().contains("No results found"));
    }

    #[test]
    fn test_no_result_renders_nothing() {
        let view = ResultView::new(None);
        assert_eq!(view.total_pages(), 0);
        assert!(view.page_rows().is_empty());
        assert_eq!(view.render(false), None);
        assert_eq!(view.header_line(), None);
    }

    #[test]
    fn test_page_window() {
        let set = result_set(95);
        let mut view = ResultView::new(Some(&set));
        assert_eq!(view.page_window(), vec![1, 2, 3, 4, 5]);
        view.go_to_page(6);
        assert_eq!(view.page_window(), vec![4, 5, 6, 7, 8]);
        view.go_to_page(10);
        assert_eq!(view.page_window(), vec![6, 7, 8, 9, 10]);

        let small = result_set(23);
        let view = ResultView::new(Some(&small));
        assert_eq!(view.page_window(), vec![1, 2, 3]);
    }

    #[test]
    fn test_render_truncates_long_cells() {
        let long = "x".repeat(80);
        let data = vec![json!({"note": long}).as_object().cloned().unwrap()];
        let set = ResultSet::new("f".into(), data, vec!["note".into()], 1).unwrap();
        let view = ResultView::new(Some(&set));
        let rendered = view.render(false).unwrap();
        assert!(rendered.contains(&format!("{}...", "x".repeat(50))));
        assert!(!rendered.contains(&"x".repeat(51)));
        assert!(rendered.starts_with("1 rows • 1 columns"));
    }

    #[test]
    fn test_render_pagination_footer() {
        let set = result_set(23);
        let mut view = ResultView::new(Some(&set));
        view.set_search("natal");
        let rendered = view.render(false).unwrap();
        assert!(rendered.contains("Showing 1 to 10 of 12 results (filtered from 23 total)"));
        assert!(rendered.contains("Page 1/2: [1] 2"));
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("abc123", "_report"), "abc123_report.csv");
    }

    #[tokio::test]
    async fn test_download_saves_report() {
        let gateway = MockGateway::new("abc123").with_result_shape(2, 2);
        gateway
            .upload(&FileHandle::in_memory("a.csv", vec![]))
            .await
            .unwrap();

        let set = result_set(2);
        let view = ResultView::new(Some(&set));
        let dir = TempDir::new().unwrap();
        let path = view
            .download(&gateway, dir.path(), DEFAULT_REPORT_SUFFIX)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(path, dir.path().join("abc123_report.csv"));
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("id,column_1\n"));
    }

    #[tokio::test]
    async fn test_download_without_result_is_noop() {
        let gateway = MockGateway::new("abc123");
        let view = ResultView::new(None);
        let dir = TempDir::new().unwrap();
        let saved = view.download(&gateway, dir.path(), "_report").await.unwrap();
        assert!(saved.is_none());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_writes_nothing() {
        let gateway = MockGateway::new("abc123");
        let dir = TempDir::new().unwrap();
        let err = download_report(&gateway, "abc123", dir.path(), "_report")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Server { status: 404, .. }));
        assert!(!dir.path().join("abc123_report.csv").exists());
    }
}
