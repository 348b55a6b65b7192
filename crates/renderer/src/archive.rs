use article_store::ArchiveEntry;
use common::ServiceResult;

/// Indented JSON array of `{date, title, topic}` in the given order.
pub fn render_archive_json(items: &[ArchiveEntry]) -> ServiceResult<String> {
    Ok(serde_json::to_string_pretty(items)?)
}
