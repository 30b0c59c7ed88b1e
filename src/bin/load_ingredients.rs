use std::{env, fs, process::ExitCode};

use recipe_book_sdk::{
    actions::{count_ingredients, insert_ingredients},
    connection::connect,
    seed::parse_ingredient_csv,
    Config,
};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_CSV_PATH: &str = "data/ingredients.csv";

fn describe(error: potion::Error) -> String {
    error.info.unwrap_or_else(|| "unknown error".to_owned())
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CSV_PATH.to_owned());

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) => {
            log::error!("Couldn't read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ingredients = match parse_ingredient_csv(&data) {
        Ok(ingredients) => ingredients,
        Err(e) => {
            log::error!("Couldn't parse {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pool = match connect(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("{}", describe(e));
            return ExitCode::FAILURE;
        }
    };

    match count_ingredients(&pool).await {
        Ok(0) => {}
        Ok(count) => {
            log::warn!(
                "Ingredients already loaded ({count} rows), exiting. Empty the ingredients table to reload them."
            );
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            log::error!("{}", describe(e));
            return ExitCode::FAILURE;
        }
    }

    match insert_ingredients(&ingredients, &pool).await {
        Ok(inserted) => {
            log::info!("Loaded {inserted} ingredients from {path}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", describe(e));
            ExitCode::FAILURE
        }
    }
}
