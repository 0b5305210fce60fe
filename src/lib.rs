pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;

use crate::commands::planner::PlannerController;
use crate::commands::AppState;
use crate::error::AppResult;

const DATABASE_FILE: &str = "tripwise.sqlite";
const LOG_DIR: &str = "logs";

/// Wires logging, the SQLite store and the AI service under `data_dir`.
pub fn bootstrap(data_dir: &Path) -> AppResult<PlannerController> {
    std::fs::create_dir_all(data_dir)?;
    crate::utils::logger::init_logging(&data_dir.join(LOG_DIR))?;

    let pool = crate::db::DbPool::new(data_dir.join(DATABASE_FILE))?;
    let state = AppState::new(pool)?;

    let controller = PlannerController::new(state)?;

    tracing::info!(
        target: "app::bootstrap",
        data_dir = %data_dir.display(),
        saved_trips = controller.saved_trips().len(),
        "planner ready"
    );
    Ok(controller)
}
