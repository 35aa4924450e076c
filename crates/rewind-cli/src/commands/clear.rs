use super::Context;
use color_eyre::Result;

pub fn run_clear(context: &Context, yes: bool) -> Result<()> {
    let output = &context.output;

    if !yes {
        output.warn("This removes every entry from the continue-watching list. Re-run with --yes to confirm");
        output.println("\nExample: rewind clear --yes");
        return Ok(());
    }

    let store = context.open_store()?;
    let count = store.history().len();
    store.clear_history();

    if store.history().is_empty() {
        output.success(format!("Cleared {} item(s) from watch history", count));
    } else {
        output.warn(format!(
            "Failed to clear watch history in {}",
            context.storage_dir.display()
        ));
    }
    Ok(())
}
