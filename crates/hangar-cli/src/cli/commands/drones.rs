//! Private drone list commands.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result, bail};
use hangar_core::api::ApiErrorKind;
use hangar_core::guard::Route;
use hangar_core::models::{
    Controller, Drone, DroneDraft, Dump, DumpReport, DumpUpload, SettingGroups, VideoSystem,
};
use hangar_core::views::ManageView;

use super::{Context, dump_columns};
use crate::cli::DroneFields;

fn summary(drone: &Drone) -> String {
    let name = drone.name.as_deref().unwrap_or("-");
    let specs: Vec<&str> = [
        drone.controller.map(Controller::as_str),
        drone.video.map(VideoSystem::as_str),
        drone.radio.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if specs.is_empty() {
        format!("#{:<5} {name}", drone.id)
    } else {
        format!("#{:<5} {name}  [{}]", drone.id, specs.join(" / "))
    }
}

fn print_detail(drone: &Drone) {
    println!("#{} {}", drone.id, drone.name.as_deref().unwrap_or("-"));
    let rows = [
        ("comment", drone.comment.as_deref()),
        ("controller", drone.controller.map(Controller::as_str)),
        ("video", drone.video.map(VideoSystem::as_str)),
        ("radio", drone.radio.as_deref()),
        ("components", drone.components.as_deref()),
    ];
    for (label, value) in rows {
        println!("  {label:<11} {}", value.unwrap_or("-"));
    }
}

fn dump_line(dump: &Dump) -> String {
    let (when, size) = dump_columns(dump);
    format!(
        "#{:<5} {when}  {size:>9}  {}",
        dump.id.map_or_else(String::new, |id| id.to_string()),
        dump.display_name()
    )
}

/// Applies the flags given on the command line over `draft`.
fn apply_fields(draft: &mut DroneDraft, fields: &DroneFields) {
    let targets = [
        (&mut draft.comment, &fields.comment),
        (&mut draft.controller, &fields.controller),
        (&mut draft.video, &fields.video),
        (&mut draft.radio, &fields.radio),
        (&mut draft.components, &fields.components),
    ];
    for (target, value) in targets {
        if let Some(value) = value {
            target.clone_from(value);
        }
    }
}

pub async fn list(ctx: &Context, query: &str) -> Result<()> {
    ctx.enter(Route::Manage)?;

    let mut view = ManageView::mount(ctx.api.clone(), ctx.lang);
    view.load().await;
    ctx.settle_view(view.session_ended(), view.banner())?;

    let matched = view.filtered(query);
    if matched.is_empty() {
        let text = if view.drones().is_empty() {
            ctx.lang.pick("Todavía no tienes drones.", "No drones yet.")
        } else {
            ctx.lang.pick("Sin resultados.", "No results.")
        };
        println!("{text}");
        return Ok(());
    }

    for drone in &matched {
        println!("{}", summary(drone));
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: i64) -> Result<()> {
    ctx.enter(Route::Drone(id))?;
    let drone = ctx.api.get_drone(id).await.map_err(|e| ctx.failure(&e))?;
    print_detail(&drone);
    Ok(())
}

pub async fn create(ctx: &Context, name: &str, fields: &DroneFields) -> Result<()> {
    ctx.enter(Route::Manage)?;

    let mut draft = DroneDraft {
        name: name.to_string(),
        ..DroneDraft::default()
    };
    apply_fields(&mut draft, fields);

    let view = ManageView::mount(ctx.api.clone(), ctx.lang);
    let drone = view.create(&draft).await.map_err(|e| ctx.failure(&e))?;

    if let Some(notice) = view.notice() {
        println!("{notice}");
    }
    println!("{}", summary(&drone));
    Ok(())
}

pub async fn update(
    ctx: &Context,
    id: i64,
    name: Option<&str>,
    fields: &DroneFields,
) -> Result<()> {
    ctx.enter(Route::Drone(id))?;

    let current = ctx.api.get_drone(id).await.map_err(|e| ctx.failure(&e))?;
    let mut draft = DroneDraft::from_drone(&current);
    if let Some(name) = name {
        draft.name = name.to_string();
    }
    apply_fields(&mut draft, fields);

    let payload = draft.validate().map_err(|e| ctx.failure(&e))?;
    let drone = ctx
        .api
        .update_drone(id, &payload)
        .await
        .map_err(|e| ctx.failure(&e))?;

    println!("{}", ctx.lang.pick("Cambios guardados.", "Changes saved."));
    print_detail(&drone);
    Ok(())
}

pub async fn delete(ctx: &Context, id: i64, confirm: &str) -> Result<()> {
    ctx.enter(Route::Drone(id))?;

    let view = ManageView::mount(ctx.api.clone(), ctx.lang);
    view.delete(id, confirm).await.map_err(|e| ctx.failure(&e))?;

    if let Some(notice) = view.notice() {
        println!("{notice}");
    }
    Ok(())
}

pub async fn dumps(ctx: &Context, id: i64) -> Result<()> {
    ctx.enter(Route::Drone(id))?;

    let dumps = ctx.api.list_dumps(id).await.map_err(|e| ctx.failure(&e))?;
    if dumps.is_empty() {
        println!("{}", ctx.lang.pick("Este dron no tiene dumps.", "No dumps for this drone."));
        return Ok(());
    }
    for dump in &dumps {
        println!("{}", dump_line(dump));
    }
    Ok(())
}

pub async fn upload(ctx: &Context, id: i64, file: &Path) -> Result<()> {
    ctx.enter(Route::Drone(id))?;

    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let upload =
        DumpUpload::new(id, &file.to_string_lossy(), bytes).map_err(|e| ctx.failure(&e))?;
    tracing::debug!(drone = id, file = upload.file_name(), bytes = upload.size(), "uploading dump");

    let dump = ctx.api.upload_dump(upload).await.map_err(|e| ctx.failure(&e))?;
    println!(
        "{}",
        ctx.lang.pick("Dump subido correctamente.", "Dump uploaded successfully.")
    );
    println!("{}", dump_line(&dump));
    Ok(())
}

pub async fn parse(
    ctx: &Context,
    drone_id: i64,
    dump_id: i64,
    profile: Option<&str>,
) -> Result<()> {
    ctx.enter(Route::DumpParse {
        drone: drone_id,
        dump: dump_id,
    })?;

    let report = match ctx.api.parse_dump(drone_id, dump_id).await {
        Ok(report) => report,
        Err(e) if e.kind == ApiErrorKind::ServerError && e.detail.is_none() => {
            bail!(
                "{}",
                ctx.lang
                    .pick("No se pudo parsear el dump.", "Could not parse the dump.")
            );
        }
        Err(e) => return Err(ctx.failure(&e)),
    };

    match profile {
        Some(name) => print_profile(ctx, &report, name),
        None => {
            print_report(&report);
            Ok(())
        }
    }
}

fn print_report(report: &DumpReport) {
    let parsed = &report.parsed;
    let drone = report.drone.as_ref().map_or_else(String::new, |d| {
        format!("  (drone #{} {})", d.id, d.name.as_deref().unwrap_or("-"))
    });
    println!("{}{drone}", dump_line(&report.dump));

    if !parsed.firmware.is_empty() {
        println!("firmware");
        for (key, value) in &parsed.firmware {
            println!("  {key:<14} {value}");
        }
    }

    let listed = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };
    println!("features");
    println!("  enabled        {}", listed(&parsed.features.enabled));
    println!("  disabled       {}", listed(&parsed.features.disabled));
    println!(
        "serial ports {}  aux modes {}  resources {}  other {}",
        parsed.ports.serial.len(),
        parsed.modes.aux.len(),
        parsed.resources.len(),
        parsed.other_commands.len()
    );
    println!("global settings {}", parsed.settings.global.len());

    let sections = [
        ("profile", parsed.settings.profiles_in_order()),
        ("rateprofile", parsed.settings.rateprofiles_in_order()),
    ];
    for (label, profiles) in sections {
        for (name, groups) in profiles {
            println!("{label} {name}  {}", group_counts(groups));
        }
    }

    if !parsed.warnings.is_empty() {
        println!("warnings");
        for warning in &parsed.warnings {
            println!("  {warning}");
        }
    }

    let count = |n: Option<i64>| n.map_or_else(|| "?".to_string(), |n| n.to_string());
    let stats = &parsed.stats;
    println!(
        "lines {}  recognized {}  unknown {}",
        count(stats.lines_total),
        count(stats.recognized),
        count(stats.unknown)
    );
}

fn group_counts(groups: &SettingGroups) -> String {
    let counts: Vec<String> = groups
        .iter()
        .filter(|(_, settings)| !settings.is_empty())
        .map(|(group, settings)| format!("{group} {}", settings.len()))
        .collect();
    if counts.is_empty() {
        "-".to_string()
    } else {
        counts.join("  ")
    }
}

fn print_profile(ctx: &Context, report: &DumpReport, name: &str) -> Result<()> {
    let settings = &report.parsed.settings;
    let Some(groups) = settings.profiles.get(name) else {
        bail!(
            "{} {name}",
            ctx.lang.pick("El dump no tiene el perfil", "The dump has no profile")
        );
    };
    let rates = settings.rateprofiles.get(name);

    for (label, groups) in [("profile", Some(groups)), ("rateprofile", rates)] {
        let Some(groups) = groups else { continue };
        println!("{label} {name}");
        for (group, values) in groups {
            println!("  [{group}]");
            for (key, value) in values {
                println!("    {key} = {value}");
            }
        }
    }
    Ok(())
}
