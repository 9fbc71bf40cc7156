use std::sync::Arc;

use log::{debug, o, Logger};
use serde_json::Value;

use crate::errors::{AdminError, StoreError, ValidationError};
use crate::ordering::{next_order, project, Child};
use crate::record::{Course, CourseDraft, LocalizedTitle, Quiz, QuizDraft, Record, Video, VideoDraft};
use crate::reference;
use crate::store::{Collection, CollectionStore, Document};

/// The document field holding a child's course ID.
const PARENT_FIELD: &str = "courseId";

pub type SafeStore = dyn CollectionStore + Send + Sync;

/// Course, video and quiz operations over a collection store. Nothing is
/// cached: every call goes to the store.
#[derive(Clone)]
pub struct Repository {
    store: Arc<SafeStore>,
    logger: Arc<Logger>,
}

impl Repository {
    pub fn new(store: Arc<SafeStore>, logger: Arc<Logger>) -> Self {
        let logger = Arc::new(logger.new(o!("component" => "repository")));

        Repository { store, logger }
    }

    pub async fn list_parents(&self) -> Result<Vec<Course>, AdminError> {
        self.fetch_all::<Course>().await
    }

    pub async fn find_parent(&self, id: &str) -> Result<Option<Course>, AdminError> {
        let courses = self.list_parents().await?;

        Ok(courses.into_iter().find(|c| c.id == id))
    }

    pub async fn create_parent(&self, draft: CourseDraft) -> Result<Course, AdminError> {
        let mut course = validate_course(draft)?;

        debug!(self.logger, "Creating course...");
        course.id = self
            .store
            .insert(Collection::Courses, course.to_fields())
            .await?;

        Ok(course)
    }

    pub async fn update_parent(&self, id: &str, draft: CourseDraft) -> Result<Course, AdminError> {
        let mut course = validate_course(draft)?;
        course.id = id.to_owned();

        debug!(self.logger, "Updating course..."; "id" => id);
        self.store
            .update(Collection::Courses, id, course.to_fields())
            .await?;

        Ok(course)
    }

    /// Deletes a course. Its videos and quizzes keep pointing at it.
    pub async fn delete_parent(&self, id: &str) -> Result<(), AdminError> {
        debug!(self.logger, "Deleting course..."; "id" => id);
        self.store.delete(Collection::Courses, id).await?;

        Ok(())
    }

    /// Lists the videos of a course, or every video if `parent_id` is
    /// absent or empty, sorted by rank.
    pub async fn list_children(&self, parent_id: Option<&str>) -> Result<Vec<Video>, AdminError> {
        let videos = self.fetch_children::<Video>(parent_id).await?;

        Ok(project(&videos, parent_id))
    }

    pub async fn create_child(&self, draft: VideoDraft) -> Result<Video, AdminError> {
        let mut video = validate_video(draft)?;

        if video.order.is_none() {
            let siblings = self.list_children(video.course_id.as_deref()).await?;
            video.order = Some(next_order(&siblings));
        }

        debug!(self.logger, "Creating video..."; "course_id" => &video.course_id, "order" => video.order);
        video.id = self
            .store
            .insert(Collection::Videos, video.to_fields())
            .await?;

        Ok(video)
    }

    /// Replaces a video. Without an explicit rank the video moves after
    /// its siblings under the (possibly new) course.
    pub async fn update_child(&self, id: &str, draft: VideoDraft) -> Result<Video, AdminError> {
        let mut video = validate_video(draft)?;
        video.id = id.to_owned();

        if video.order.is_none() {
            let siblings = self.list_children(video.course_id.as_deref()).await?;
            let siblings = siblings.iter().filter(|sibling| sibling.id() != id);
            video.order = Some(next_order(siblings));
        }

        debug!(self.logger, "Updating video..."; "id" => id, "order" => video.order);
        self.store
            .update(Collection::Videos, id, video.to_fields())
            .await?;

        Ok(video)
    }

    /// Deletes a video. The remaining videos keep their ranks.
    pub async fn delete_child(&self, id: &str) -> Result<(), AdminError> {
        debug!(self.logger, "Deleting video..."; "id" => id);
        self.store.delete(Collection::Videos, id).await?;

        Ok(())
    }

    pub async fn list_quizzes(&self, parent_id: Option<&str>) -> Result<Vec<Quiz>, AdminError> {
        let quizzes = self.fetch_children::<Quiz>(parent_id).await?;

        Ok(project(&quizzes, parent_id))
    }

    pub async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, AdminError> {
        let mut quiz = validate_quiz(draft)?;

        debug!(self.logger, "Creating quiz..."; "course_id" => &quiz.course_id);
        quiz.id = self
            .store
            .insert(Collection::Quizzes, quiz.to_fields())
            .await?;

        Ok(quiz)
    }

    pub async fn update_quiz(&self, id: &str, draft: QuizDraft) -> Result<Quiz, AdminError> {
        let mut quiz = validate_quiz(draft)?;
        quiz.id = id.to_owned();

        debug!(self.logger, "Updating quiz..."; "id" => id);
        self.store
            .update(Collection::Quizzes, id, quiz.to_fields())
            .await?;

        Ok(quiz)
    }

    pub async fn delete_quiz(&self, id: &str) -> Result<(), AdminError> {
        debug!(self.logger, "Deleting quiz..."; "id" => id);
        self.store.delete(Collection::Quizzes, id).await?;

        Ok(())
    }

    /// Points every stored video at `parent_id`, one update per video. Stops at
    /// the first failure; videos already updated stay updated.
    pub async fn link_all_children_to(&self, parent_id: &str) -> Result<usize, AdminError> {
        if parent_id.trim().is_empty() {
            return Err(ValidationError::missing("course_id").into());
        }

        let documents = self.store.fetch_all(Collection::Videos).await?;
        let mut count = 0;

        for document in documents {
            let mut fields = serde_json::Map::new();
            fields.insert(PARENT_FIELD.to_owned(), Value::from(parent_id));

            debug!(self.logger, "Linking video..."; "id" => &document.id, "course_id" => parent_id);
            self.store
                .update(Collection::Videos, &document.id, fields)
                .await?;
            count += 1;
        }

        Ok(count)
    }

    async fn fetch_all<R: Record>(&self) -> Result<Vec<R>, AdminError> {
        let documents = self.store.fetch_all(R::COLLECTION).await?;

        decode_all(documents)
    }

    async fn fetch_children<R: Record + Child>(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<R>, AdminError> {
        let documents = match parent_id.filter(|p| !p.is_empty()) {
            Some(parent_id) => {
                self.store
                    .fetch_where(R::COLLECTION, PARENT_FIELD, &Value::from(parent_id))
                    .await?
            }
            None => self.store.fetch_all(R::COLLECTION).await?,
        };

        decode_all(documents)
    }
}

fn decode_all<R: Record>(documents: Vec<Document>) -> Result<Vec<R>, AdminError> {
    let records = documents
        .into_iter()
        .map(R::from_document)
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(records)
}

fn validate_title(title: LocalizedTitle) -> Result<LocalizedTitle, ValidationError> {
    let primary = title.primary.trim();

    if primary.is_empty() {
        return Err(ValidationError::missing("title"));
    }

    Ok(LocalizedTitle::new(primary, non_blank(title.secondary)))
}

fn validate_parent_id(course_id: String) -> Result<String, ValidationError> {
    let course_id = course_id.trim();

    if course_id.is_empty() {
        Err(ValidationError::missing("course_id"))
    } else {
        Ok(course_id.to_owned())
    }
}

fn validate_course(draft: CourseDraft) -> Result<Course, ValidationError> {
    Ok(Course {
        id: String::new(),
        title: validate_title(draft.title)?,
        description: draft.description,
        instructor: draft.instructor.trim().to_owned(),
        image_url: non_blank(draft.image_url),
    })
}

fn validate_video(draft: VideoDraft) -> Result<Video, ValidationError> {
    let title = validate_title(draft.title)?;
    let course_id = validate_parent_id(draft.course_id)?;

    if let Some(order) = draft.order {
        if order < 1 {
            return Err(ValidationError::new("order", "must be a positive number"));
        }
    }

    Ok(Video {
        id: String::new(),
        course_id: Some(course_id),
        title,
        order: draft.order,
        youtube_id: non_blank(draft.youtube_id).map(|r| reference::normalize(&r)),
    })
}

fn validate_quiz(draft: QuizDraft) -> Result<Quiz, ValidationError> {
    Ok(Quiz {
        id: String::new(),
        title: validate_title(draft.title)?,
        course_id: Some(validate_parent_id(draft.course_id)?),
        questions: draft.questions,
    })
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty())
}
