use std::sync::Arc;

use log::{debug, error, Logger};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::AdminError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The largest form submission to accept.
const MAX_CONTENT_LENGTH: u64 = 64 * 1024;

/// Combines every API route, turning failures into JSON replies.
pub fn make_api(environment: Environment) -> BoxedFilter<(Box<dyn Reply>,)> {
    let logger = environment.logger.clone();

    make_me_route(environment.clone())
        .or(make_courses_route(environment.clone()))
        .unify()
        .or(make_create_course_route(environment.clone()))
        .unify()
        .or(make_course_route(environment.clone()))
        .unify()
        .or(make_update_course_route(environment.clone()))
        .unify()
        .or(make_delete_course_route(environment.clone()))
        .unify()
        .or(make_videos_route(environment.clone()))
        .unify()
        .or(make_create_video_route(environment.clone()))
        .unify()
        .or(make_update_video_route(environment.clone()))
        .unify()
        .or(make_delete_video_route(environment.clone()))
        .unify()
        .or(make_quizzes_route(environment.clone()))
        .unify()
        .or(make_create_quiz_route(environment.clone()))
        .unify()
        .or(make_update_quiz_route(environment.clone()))
        .unify()
        .or(make_delete_quiz_route(environment))
        .unify()
        .recover(move |r| format_rejection(logger.clone(), r))
        .map(|reply| Box::new(reply) as Box<dyn Reply>)
        .boxed()
}

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if status.is_server_error() {
            error!(logger, "Request failed"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            debug!(logger, "Request refused"; "context" => ?r.context, "status" => %status, "message" => %r.error);
        }

        return Ok(with_status(json(&r.flatten()), status));
    }

    if let Some(cause) = malformed_request_cause(&rej) {
        debug!(logger, "Malformed request"; "cause" => %cause);

        return Ok(with_status(
            json(&rejection::malformed_request()),
            StatusCode::BAD_REQUEST,
        ));
    }

    Err(rej)
}

/// Describes why warp could not read the request body or query, if it
/// could not.
fn malformed_request_cause(rej: &reject::Rejection) -> Option<String> {
    if let Some(e) = rej.find::<warp::body::BodyDeserializeError>() {
        Some(e.to_string())
    } else if let Some(e) = rej.find::<reject::InvalidQuery>() {
        Some(e.to_string())
    } else if let Some(e) = rej.find::<reject::PayloadTooLarge>() {
        Some(e.to_string())
    } else {
        None
    }
}

fn status_code_for(e: &AdminError) -> StatusCode {
    use AdminError::*;

    if e.is_not_found() {
        return StatusCode::NOT_FOUND;
    }

    match e {
        Validation(_) => StatusCode::BAD_REQUEST,
        Unauthenticated => StatusCode::UNAUTHORIZED,
        Forbidden { .. } => StatusCode::FORBIDDEN,
        Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use std::sync::Arc;

    use serde::de::DeserializeOwned;
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par, post, put, query};

    use super::rejection::{Context, Rejection};
    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;
    use crate::identity::{Identity, IdentityConfig};
    use crate::record::{CourseDraft, QuizDraft, VideoDraft};

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let a = environment.config.api_path.clone();
            let identity = signed_in(environment.identity.clone());

            // identity is checked before any body or query is read
            let $route_variable = warp::any()
                .map(move || environment.clone())
                .and(p(a))
                .and(identity);

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_me_route => me, rt; p("me"), end(), g());
    route!(make_courses_route => courses, rt; p("courses"), end(), g());
    route!(make_create_course_route => create_course, rt; p("courses"), end(), post(), body::<CourseDraft>());
    route!(make_course_route => course, rt; p("courses"), par::<String>(), end(), g());
    route!(make_update_course_route => update_course, rt; p("courses"), par::<String>(), end(), put(), body::<CourseDraft>());
    route!(make_delete_course_route => delete_course, rt; p("courses"), par::<String>(), end(), delete());
    route!(make_videos_route => videos, rt; p("videos"), end(), g(), query::<q::ViewQuery>());
    route!(make_create_video_route => create_video, rt; p("videos"), end(), post(), query::<q::ViewQuery>(), body::<VideoDraft>());
    route!(make_update_video_route => update_video, rt; p("videos"), par::<String>(), end(), put(), query::<q::ViewQuery>(), body::<VideoDraft>());
    route!(make_delete_video_route => delete_video, rt; p("videos"), par::<String>(), end(), delete(), query::<q::ViewQuery>());
    route!(make_quizzes_route => quizzes, rt; p("quizzes"), end(), g(), query::<q::ViewQuery>());
    route!(make_create_quiz_route => create_quiz, rt; p("quizzes"), end(), post(), query::<q::ViewQuery>(), body::<QuizDraft>());
    route!(make_update_quiz_route => update_quiz, rt; p("quizzes"), par::<String>(), end(), put(), query::<q::ViewQuery>(), body::<QuizDraft>());
    route!(make_delete_quiz_route => delete_quiz, rt; p("quizzes"), par::<String>(), end(), delete(), query::<q::ViewQuery>());

    fn body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
        warp::body::content_length_limit(MAX_CONTENT_LENGTH).and(warp::body::json())
    }

    /// Extracts the signed-in administrator or rejects the request.
    fn signed_in(
        config: Arc<IdentityConfig>,
    ) -> impl Filter<Extract = (Identity,), Error = warp::Rejection> + Clone {
        warp::header::headers_cloned().and_then(move |headers: warp::http::HeaderMap| {
            let config = config.clone();

            async move {
                config
                    .authorize(&headers)
                    .map_err(|e| warp::reject::custom(Rejection::new(Context::identity(), e)))
            }
        })
    }
}
