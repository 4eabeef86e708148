use super::Context;
use crate::output::Output;
use color_eyre::Result;

pub async fn run_clear(ctx: &Context, cache: bool, output: &Output) -> Result<()> {
    if !cache {
        output.warn("No clear option specified. Use --cache");
        output.info("\nExample: marquee clear --cache");
        return Ok(());
    }

    let service = ctx.service()?;
    service.clear_cache().await?;
    output.success(format!(
        "Cleared metadata cache: {}",
        service.cache().dir().display()
    ));
    Ok(())
}
