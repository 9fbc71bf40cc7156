use std::error::Error;
use std::sync::Arc;

use futures::future::FutureExt;
use log::{info, initialize_logger, warn};
use tokio::sync::mpsc;

use course_admin::config::{get_variable, get_variable_or, parse_variable};
use course_admin::environment::{Config, Environment};
use course_admin::identity::{IdentityConfig, DEFAULT_DISPLAY_NAME_HEADER, DEFAULT_EMAIL_HEADER};
use course_admin::repository::Repository;
use course_admin::routes;
use course_admin::store::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = parse_variable("COURSE_ADMIN_PORT");
    let admin_port: u16 = parse_variable("COURSE_ADMIN_ADMIN_PORT");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("COURSE_ADMIN_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string).await?;
    let store = Arc::new(PgStore::new(pool));

    let repository = Arc::new(Repository::new(store, logger.clone()));

    let allowed = IdentityConfig::parse_allowed(&get_variable_or("COURSE_ADMIN_ALLOWED_ADMINS", ""));
    if allowed.is_none() {
        warn!(logger, "No administrator allow-list; every signed-in user may manage courses");
    }

    let identity = Arc::new(IdentityConfig::new(
        get_variable_or("COURSE_ADMIN_IDENTITY_HEADER", DEFAULT_EMAIL_HEADER),
        get_variable_or("COURSE_ADMIN_DISPLAY_NAME_HEADER", DEFAULT_DISPLAY_NAME_HEADER),
        allowed,
    ));

    let config = Config::new(get_variable_or("COURSE_ADMIN_API_PATH", "api"));
    let environment = Environment::new(logger.clone(), repository, identity, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: routes::admin::TerminationFunctionWrapper = {
        let logger = logger.clone();

        Arc::new(move || {
            let termination_sender = termination_sender.clone();
            let logger = logger.clone();

            async move {
                // the receiver only goes away once shutdown has begun
                if termination_sender.send(()).await.is_err() {
                    info!(logger, "Already terminating");
                }
            }
            .boxed()
        })
    };

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let (_, main_server) = warp::serve(routes::make_api(environment.clone()))
            .bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        use warp::Filter;

        let should_terminate = should_terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
