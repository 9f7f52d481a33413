//! Template command handlers
//!
//! Slots are numbered 1 to 3 on the command line.

use anyhow::{bail, Context, Result};

use mendan_core::templates::TEMPLATE_SLOTS;
use mendan_core::TemplateStore;

use crate::editor::{confirm_unless, edit_text};
use crate::output::Output;

/// List all slots
pub fn list(templates: &TemplateStore, output: &Output) -> Result<()> {
    output.print_templates(templates.templates());
    Ok(())
}

/// Print one slot
pub fn show(templates: &TemplateStore, slot: usize, output: &Output) -> Result<()> {
    let index = slot_index(slot)?;
    output.print_template(slot, templates.get(index).unwrap_or_default());
    Ok(())
}

/// Set a slot, opening the editor when no text is given
pub fn set(
    templates: &mut TemplateStore,
    slot: usize,
    text: Option<String>,
    output: &Output,
) -> Result<()> {
    let index = slot_index(slot)?;

    let content = match text {
        Some(t) => t,
        None => {
            let current = templates.get(index).unwrap_or_default();
            edit_text(current).context("Failed to edit template")?
        }
    };

    templates.save(index, content);
    output.success(&format!("テンプレート {} を保存しました。", slot));
    Ok(())
}

/// Empty a slot
pub fn clear(templates: &mut TemplateStore, slot: usize, yes: bool, output: &Output) -> Result<()> {
    let index = slot_index(slot)?;

    if !confirm_unless(yes, &format!("テンプレート {} を削除しますか？", slot))? {
        output.message("Cancelled.");
        return Ok(());
    }

    templates.clear(index);
    output.success(&format!("テンプレート {} を削除しました。", slot));
    Ok(())
}

/// Map a 1-based slot number to an index
fn slot_index(slot: usize) -> Result<usize> {
    if slot == 0 || slot > TEMPLATE_SLOTS {
        bail!("Template slot must be between 1 and {}", TEMPLATE_SLOTS);
    }
    Ok(slot - 1)
}
