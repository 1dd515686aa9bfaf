//! StayBuddy Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;

use anyhow::Context;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{info, warn};

use StayBuddy::{
    config::Settings,
    database::{connection::create_pool, ensure_schema, DatabaseConfig, DatabaseService},
    handlers::{self, Command},
    services::ServiceFactory,
    state::AppContext,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Failed to load settings")?;
    settings.validate().context("Invalid configuration")?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging).context("Failed to initialize logging")?;

    info!("Starting {}...", StayBuddy::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = DatabaseConfig::from(&settings.database);
    let db_pool = create_pool(&db_config).await.context("Failed to connect to the database")?;

    info!("Ensuring database schema...");
    ensure_schema(&db_pool).await.context("Failed to create the database schema")?;
    let database_service = DatabaseService::new(db_pool);

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);
    let bot_username = match settings.bot.username.clone() {
        Some(username) => username,
        None => bot
            .get_me()
            .await
            .context("Failed to fetch the bot profile")?
            .username()
            .to_string(),
    };
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), &settings, database_service.clone());

    let mut reminder_scheduler = services.reminder_scheduler(&settings);
    if settings.reminders.enabled {
        reminder_scheduler.start();
    } else {
        info!("Reminder sweep disabled");
    }

    let context = Arc::new(AppContext::new(
        settings,
        database_service,
        services,
        bot_username,
    ));

    // Create dispatcher with dependencies registered
    let mut dispatcher = Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![context])
        .default_handler(|upd| async move {
            warn!(update_id = upd.id.0, "Unhandled update");
        })
        .enable_ctrlc_handler()
        .build();

    info!("StayBuddy bot is ready, starting polling...");
    dispatcher.dispatch().await;

    reminder_scheduler.stop();
    info!("StayBuddy bot has been shut down.");

    Ok(())
}
