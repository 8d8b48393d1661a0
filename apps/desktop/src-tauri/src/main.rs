// Candela Desktop - Tauri shell
// Hosts the UI and routes its commands into the Candela core

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod host;

use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use candela_server::commands::{CommandBoundary, CommandQueue, CommandWorker};
use candela_server::config::AppConfig;
use candela_server::models::InvokeResponse;
use candela_server::services::{init_logger, LogManager};
use candela_server::state::CoreState;
use serde_json::Value;
use tauri::{image::Image, App, Manager, RunEvent, State};

use host::{TauriEventSink, TauriHost};

/// Worker handle kept until exit so pending settings are flushed before the process ends
struct WorkerSlot(Mutex<Option<CommandWorker>>);

/// Single entry point for the UI; every call goes through the command queue.
#[tauri::command]
async fn invoke(
    command: String,
    payload: Option<Value>,
    queue: State<'_, CommandQueue>,
) -> Result<InvokeResponse, String> {
    let payload = payload.unwrap_or(Value::Null);
    Ok(queue.invoke(&command, &payload).await)
}

fn resolve_config(app: &App) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let data_dir = match env::var("CANDELA_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => app.path().app_data_dir()?,
    };
    let resources_dir = match env::var("CANDELA_RESOURCES_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => app.path().resource_dir()?.join("resources"),
    };

    let mut config = AppConfig::new(data_dir, resources_dir);
    if let Ok(log_file) = env::var("CANDELA_LOG_FILE") {
        config.log_file = PathBuf::from(log_file);
    }
    Ok(config)
}

fn setup(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(app)?;
    std::fs::create_dir_all(&config.data_dir)?;
    std::fs::create_dir_all(&config.image_cache_dir)?;

    let log_manager = Arc::new(LogManager::new(config.log_file.clone(), config.dev));
    if let Err(e) = init_logger(log_manager.clone()) {
        log_manager.write(format!("Failed to install logger: {e}"));
    }

    if let Some(window) = app.get_webview_window("main") {
        let icon_bytes = include_bytes!("../icons/icon.png").to_vec();
        if let Ok(icon) = Image::from_bytes(&icon_bytes) {
            if let Err(e) = window.set_icon(icon) {
                log::warn!("Failed to set window icon: {e}");
            }
        }
    }

    let core = CoreState::load(&config, log_manager);
    let handle = app.handle().clone();
    let boundary = CommandBoundary::new(
        core,
        Arc::new(TauriHost::new(handle.clone())),
        Arc::new(TauriEventSink::new(handle)),
    );
    let (queue, worker) = CommandQueue::spawn(boundary)?;

    app.manage(queue);
    app.manage(WorkerSlot(Mutex::new(Some(worker))));

    log::info!("Candela Desktop initialized");
    Ok(())
}

fn main() {
    let app = tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_notification::init())
        .setup(setup)
        .invoke_handler(tauri::generate_handler![invoke])
        .build(tauri::generate_context!());

    let app = match app {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error while building tauri application: {e}");
            std::process::exit(1);
        }
    };

    app.run(|app_handle, event| {
        if let RunEvent::Exit = event {
            log::info!("Candela Desktop exiting");
            if let Some(queue) = app_handle.try_state::<CommandQueue>() {
                queue.shutdown();
            }
            if let Some(slot) = app_handle.try_state::<WorkerSlot>() {
                let worker = match slot.0.lock() {
                    Ok(mut guard) => guard.take(),
                    Err(_) => None,
                };
                if let Some(worker) = worker {
                    worker.join();
                }
            }
        }
    });
}
