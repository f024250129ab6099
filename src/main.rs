use std::net::SocketAddr;

use astra::Server;
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

use bhproperties::auth::otp::{OtpConfig, OtpService};
use bhproperties::config::Config;
use bhproperties::db::connection::{init_db, Database};
use bhproperties::mailer::Mailer;
use bhproperties::responses::error_to_response;
use bhproperties::router::{handle, App};

fn main() {
    TermLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .ok();

    let cfg = Config::from_env();

    let db = Database::new(cfg.database_path.clone());
    if let Err(e) = init_db(&db, &cfg.schema_path) {
        log::error!("database initialization failed: {e}");
        std::process::exit(1);
    }
    log::info!("database initialized from {}", cfg.schema_path);

    let app = App {
        db,
        mailer: Mailer::from_config(&cfg),
        otp: OtpService::new(OtpConfig::default()),
    };

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    log::info!("starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &app) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        log::error!("server ended with error: {e}");
    }

    log::info!("server shut down cleanly");
}
