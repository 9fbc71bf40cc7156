use std::time::{Duration, Instant};

use log::debug;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::environment::Environment;
use crate::errors::{AdminError, StoreError};
use crate::identity::Identity;
use crate::record::{CourseDraft, QuizDraft, VideoDraft};
use crate::routes::{
    query::ViewQuery,
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::store::Collection;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn me(_environment: Environment, identity: Identity) -> RouteResult {
    timed! {
        let Identity { email, display_name } = identity;

        json(&SuccessResponse::Identity { email, display_name })
    }
}

pub async fn courses(environment: Environment, _identity: Identity) -> RouteResult {
    timed! {
        let courses = environment
            .repository
            .list_parents()
            .await
            .map_err(|e| Rejection::new(Context::courses(), e))?;

        json(&SuccessResponse::Courses { courses })
    }
}

pub async fn create_course(
    environment: Environment,
    identity: Identity,
    draft: CourseDraft,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::create_course(), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Creating course..."; "admin" => &identity.email);
        let course = repository.create_parent(draft).await.map_err(&error_handler)?;
        let courses = repository.list_parents().await.map_err(&error_handler)?;

        with_status(json(&SuccessResponse::CourseSaved { course, courses }), StatusCode::CREATED)
    }
}

pub async fn course(environment: Environment, _identity: Identity, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::course(id.clone()), e);
        let repository = &environment.repository;

        let course = repository
            .find_parent(&id)
            .await
            .map_err(&error_handler)?
            .ok_or_else(|| error_handler(not_found(Collection::Courses, &id)))?;
        let videos = repository.list_children(Some(&id)).await.map_err(&error_handler)?;

        json(&SuccessResponse::CourseDetail { course, videos })
    }
}

pub async fn update_course(
    environment: Environment,
    identity: Identity,
    id: String,
    draft: CourseDraft,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::update_course(id.clone()), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Updating course..."; "id" => &id, "admin" => &identity.email);
        let course = repository.update_parent(&id, draft).await.map_err(&error_handler)?;
        let courses = repository.list_parents().await.map_err(&error_handler)?;

        json(&SuccessResponse::CourseSaved { course, courses })
    }
}

pub async fn delete_course(
    environment: Environment,
    identity: Identity,
    id: String,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::delete_course(id.clone()), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Deleting course..."; "id" => &id, "admin" => &identity.email);
        repository.delete_parent(&id).await.map_err(&error_handler)?;
        let courses = repository.list_parents().await.map_err(&error_handler)?;

        json(&SuccessResponse::Courses { courses })
    }
}

pub async fn videos(environment: Environment, _identity: Identity, view: ViewQuery) -> RouteResult {
    timed! {
        let videos = environment
            .repository
            .list_children(view.course())
            .await
            .map_err(|e| Rejection::new(Context::videos(view.course.clone()), e))?;

        json(&SuccessResponse::Videos { videos })
    }
}

pub async fn create_video(
    environment: Environment,
    identity: Identity,
    view: ViewQuery,
    draft: VideoDraft,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::create_video(), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Creating video..."; "course_id" => &draft.course_id, "admin" => &identity.email);
        let video = repository.create_child(draft).await.map_err(&error_handler)?;
        let videos = repository.list_children(view.course()).await.map_err(&error_handler)?;

        with_status(json(&SuccessResponse::VideoSaved { video, videos }), StatusCode::CREATED)
    }
}

pub async fn update_video(
    environment: Environment,
    identity: Identity,
    id: String,
    view: ViewQuery,
    draft: VideoDraft,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::update_video(id.clone()), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Updating video..."; "id" => &id, "admin" => &identity.email);
        let video = repository.update_child(&id, draft).await.map_err(&error_handler)?;
        let videos = repository.list_children(view.course()).await.map_err(&error_handler)?;

        json(&SuccessResponse::VideoSaved { video, videos })
    }
}

pub async fn delete_video(
    environment: Environment,
    identity: Identity,
    id: String,
    view: ViewQuery,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::delete_video(id.clone()), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Deleting video..."; "id" => &id, "admin" => &identity.email);
        repository.delete_child(&id).await.map_err(&error_handler)?;
        let videos = repository.list_children(view.course()).await.map_err(&error_handler)?;

        json(&SuccessResponse::Videos { videos })
    }
}

pub async fn quizzes(
    environment: Environment,
    _identity: Identity,
    view: ViewQuery,
) -> RouteResult {
    timed! {
        let quizzes = environment
            .repository
            .list_quizzes(view.course())
            .await
            .map_err(|e| Rejection::new(Context::quizzes(view.course.clone()), e))?;

        json(&SuccessResponse::Quizzes { quizzes })
    }
}

pub async fn create_quiz(
    environment: Environment,
    identity: Identity,
    view: ViewQuery,
    draft: QuizDraft,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::create_quiz(), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Creating quiz..."; "course_id" => &draft.course_id, "admin" => &identity.email);
        let quiz = repository.create_quiz(draft).await.map_err(&error_handler)?;
        let quizzes = repository.list_quizzes(view.course()).await.map_err(&error_handler)?;

        with_status(json(&SuccessResponse::QuizSaved { quiz, quizzes }), StatusCode::CREATED)
    }
}

pub async fn update_quiz(
    environment: Environment,
    identity: Identity,
    id: String,
    view: ViewQuery,
    draft: QuizDraft,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::update_quiz(id.clone()), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Updating quiz..."; "id" => &id, "admin" => &identity.email);
        let quiz = repository.update_quiz(&id, draft).await.map_err(&error_handler)?;
        let quizzes = repository.list_quizzes(view.course()).await.map_err(&error_handler)?;

        json(&SuccessResponse::QuizSaved { quiz, quizzes })
    }
}

pub async fn delete_quiz(
    environment: Environment,
    identity: Identity,
    id: String,
    view: ViewQuery,
) -> RouteResult {
    timed! {
        let error_handler = |e: AdminError| Rejection::new(Context::delete_quiz(id.clone()), e);
        let repository = &environment.repository;

        debug!(environment.logger, "Deleting quiz..."; "id" => &id, "admin" => &identity.email);
        repository.delete_quiz(&id).await.map_err(&error_handler)?;
        let quizzes = repository.list_quizzes(view.course()).await.map_err(&error_handler)?;

        json(&SuccessResponse::Quizzes { quizzes })
    }
}

fn not_found(collection: Collection, id: &str) -> AdminError {
    AdminError::Store(StoreError::NotFound {
        collection,
        id: id.to_owned(),
    })
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
