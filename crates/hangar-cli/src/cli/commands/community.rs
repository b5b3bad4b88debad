//! Community feed commands.

use anyhow::Result;
use hangar_core::feed::Listing;
use hangar_core::guard::Route;
use hangar_core::models::PublishDraft;
use hangar_core::views::CommunityView;

use super::{Context, dump_columns};

/// Mounts the community view and loads the feed once.
async fn load(ctx: &Context) -> Result<CommunityView> {
    let mut view = CommunityView::mount(ctx.api.clone(), ctx.lang);
    view.refresh().await;
    ctx.settle_view(view.session_ended(), view.banner())?;
    Ok(view)
}

fn print_notice<T>(ctx: &Context, listing: &Listing<'_, T>) -> bool {
    match listing.notice(ctx.lang) {
        Some(text) => {
            println!("{text}");
            true
        }
        None => false,
    }
}

pub async fn drones(ctx: &Context, query: &str) -> Result<()> {
    ctx.enter(Route::CommunityDrones)?;
    let view = load(ctx).await?;
    let feed = view.feed();

    let listing = feed.posts(query);
    if print_notice(ctx, &listing) {
        return Ok(());
    }

    for entry in listing.items() {
        println!(
            "{}  ({} {})",
            entry.display_title(),
            ctx.lang.pick("por", "by"),
            entry.owner.display_handle()
        );
        if let Some(note) = &entry.post.public_note {
            println!("    {note}");
        }
        let mut specs = vec![format!(
            "drone #{}",
            entry.drone.id.map_or_else(String::new, |id| id.to_string())
        )];
        specs.extend(entry.drone.controller.map(|c| c.as_str().to_string()));
        specs.extend(entry.drone.video.map(|v| v.as_str().to_string()));
        specs.extend(entry.drone.radio.clone());
        println!("    {}  ·  {} dumps", specs.join(" / "), entry.dumps.len());
    }
    Ok(())
}

pub async fn dumps(ctx: &Context, query: &str) -> Result<()> {
    ctx.enter(Route::CommunityDumps)?;
    let view = load(ctx).await?;
    let feed = view.feed();

    let listing = feed.dump_rows(query);
    if print_notice(ctx, &listing) {
        return Ok(());
    }

    for row in listing.items() {
        let (when, size) = dump_columns(&row.dump);
        println!(
            "{when}  {size:>9}  {}  {} / {}",
            row.dump.display_name(),
            row.display_drone(),
            row.display_owner()
        );
    }
    Ok(())
}

pub async fn publish(
    ctx: &Context,
    drone_id: i64,
    title: &str,
    note: &str,
    is_public: bool,
) -> Result<()> {
    ctx.enter(Route::Drone(drone_id))?;

    let drone = ctx
        .api
        .get_drone(drone_id)
        .await
        .map_err(|e| ctx.failure(&e))?;
    let draft = PublishDraft {
        drone_id,
        is_public,
        title: title.to_string(),
        public_note: note.to_string(),
    };
    let payload = draft
        .validate(drone.name.as_deref())
        .map_err(|e| ctx.failure(&e))?;

    ctx.api
        .publish(&payload)
        .await
        .map_err(|e| ctx.failure(&e))?;

    let text = if is_public {
        ctx.lang.pick("Publicado en la comunidad.", "Published to the community.")
    } else {
        ctx.lang.pick("Oculto de la comunidad.", "Hidden from the community.")
    };
    println!("{text}");
    Ok(())
}

pub async fn share_dump(ctx: &Context, dump_id: i64, is_public: bool) -> Result<()> {
    ctx.enter(Route::Manage)?;

    let state = ctx
        .api
        .set_dump_visibility(dump_id, is_public)
        .await
        .map_err(|e| ctx.failure(&e))?;

    let text = if state.is_public {
        ctx.lang.pick("Dump público.", "Dump is public.")
    } else {
        ctx.lang.pick("Dump privado.", "Dump is private.")
    };
    println!("{text}");
    Ok(())
}
