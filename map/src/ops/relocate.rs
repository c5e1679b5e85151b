//! Moving a map to a new file location.

use mapwright_core::abstract_editor::EditActionResult;

use crate::catalog;
use crate::editor::MapEditor;
use crate::error::{DocumentError, InvalidOperation};
use crate::path;

/// Changes the document path to the absolute `new_path`.
///
/// Resource sources are relative to the map file, so every resource whose
/// location is known gets its source rewritten to keep pointing at the
/// same file from the new directory. Path and sources change in one
/// transaction.
pub fn relocate(editor: &mut MapEditor, new_path: &str) -> EditActionResult<bool> {
    if !new_path.starts_with('/') {
        return Err(DocumentError::from(InvalidOperation::RelativePath(new_path.to_string())).into());
    }
    let doc = editor.document();
    let mut tx = editor.transaction("Relocate");
    if !tx.relocate(doc, new_path) {
        return Ok(false);
    }

    let new_dir = path::dir(new_path);
    if let Some(resources) = catalog::resources(doc) {
        for res in doc.descendants(resources) {
            if doc.get_str(res, "src").is_none() {
                continue;
            }
            if let Some(location) = catalog::resource_location(doc, res) {
                tx.set_attribute(doc, res, "src", path::rebase(&location, new_dir))?;
            }
        }
    }
    log::info!("Relocating \"{}\" to \"{new_path}\"", doc.path());
    Ok(editor.commit(tx)?.is_recorded())
}
