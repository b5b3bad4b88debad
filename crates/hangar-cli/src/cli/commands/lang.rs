//! Language preference.

use anyhow::{Result, anyhow};
use hangar_core::guard::Route;
use hangar_core::session::Language;

use super::Context;

pub fn run(ctx: &Context, code: Option<&str>) -> Result<()> {
    ctx.enter(Route::Home)?;

    let Some(code) = code else {
        println!("{}", ctx.lang);
        return Ok(());
    };

    let lang: Language = code.parse().map_err(|e: String| anyhow!(e))?;
    let storage = ctx.api.session().storage();
    lang.save(storage.as_ref())?;
    println!("{lang}");
    Ok(())
}
