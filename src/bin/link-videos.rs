use std::error::Error;
use std::sync::Arc;

use dotenv::dotenv;
use log::{info, initialize_logger};
use structopt::StructOpt;

use course_admin::config::get_variable;
use course_admin::repository::Repository;
use course_admin::store::PgStore;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "link-videos",
    about = "Attach every stored video to the given course"
)]
struct Opt {
    /// The course every video should belong to
    course_id: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = Arc::new(initialize_logger());

    let connection_string = get_variable("COURSE_ADMIN_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string).await?;
    let repository = Repository::new(Arc::new(PgStore::new(pool)), logger.clone());

    info!(logger, "Linking videos..."; "course_id" => &opt.course_id);
    let count = repository.link_all_children_to(&opt.course_id).await?;
    info!(logger, "Linked videos"; "course_id" => &opt.course_id, "count" => count);

    println!("{}", count);

    Ok(())
}
