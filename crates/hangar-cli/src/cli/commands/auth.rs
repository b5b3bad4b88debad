//! Sign-in, registration and sign-out.

use anyhow::{Result, bail};
use hangar_core::guard::Route;
use hangar_core::models::Credentials;

use super::Context;

pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    ctx.enter(Route::Login)?;
    let lang = ctx.lang;

    if let Some(notice) = ctx.api.session().take_notice()? {
        eprintln!("{notice}");
    }

    let credentials = Credentials::new(email, password).map_err(|e| ctx.failure(&e))?;
    match ctx.api.login(&credentials).await {
        Ok(_) => {}
        Err(e) if e.is_unauthorized() => {
            let detail = e
                .detail
                .unwrap_or_else(|| lang.pick("Credenciales inválidas.", "Invalid credentials.").to_string());
            bail!("{detail}");
        }
        Err(e) => return Err(ctx.failure(&e)),
    }

    println!("{}", lang.pick("Sesión iniciada.", "Signed in."));
    println!(
        "{} {}",
        lang.pick("Continúa en", "Continue at"),
        ctx.guard.after_sign_in()
    );
    Ok(())
}

pub async fn register(ctx: &Context, email: &str, password: &str) -> Result<()> {
    ctx.enter(Route::Login)?;
    let lang = ctx.lang;

    let credentials = Credentials::new(email, password).map_err(|e| ctx.failure(&e))?;
    let account = ctx
        .api
        .register(&credentials)
        .await
        .map_err(|e| ctx.failure(&e))?;

    tracing::debug!(id = ?account.id, "account created");
    println!(
        "{}",
        lang.pick(
            "Cuenta creada. Ahora puedes iniciar sesión.",
            "Account created. You can now sign in."
        )
    );
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.enter(Route::Home)?;
    ctx.api.logout()?;
    println!("{}", ctx.lang.pick("Sesión cerrada.", "Signed out."));
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    ctx.enter(Route::HomeLogged)?;
    let account = ctx.api.me().await.map_err(|e| ctx.failure(&e))?;
    println!("{}", account.email.as_deref().unwrap_or("?"));
    Ok(())
}
