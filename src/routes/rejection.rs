use serde::Serialize;
use warp::reject;

use crate::errors::{AdminError, StoreError};

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: AdminError,
}

impl Rejection {
    pub fn new(context: Context, error: AdminError) -> Self {
        Rejection { context, error }
    }

    /// The reply body. Store failures are described only generically;
    /// the details go to the log.
    pub fn flatten(&self) -> FlattenedRejection {
        let field = match &self.error {
            AdminError::Validation(e) => Some(e.field),
            _ => None,
        };

        FlattenedRejection {
            context: self.context.clone(),
            field,
            message: Message::for_error(&self.error),
        }
    }
}

impl reject::Reject for Rejection {}

/// The reply body for a request whose body or query could not be read.
pub fn malformed_request() -> FlattenedRejection {
    FlattenedRejection {
        context: Context::Request,
        field: None,
        message: Message::CHECK_FIELDS,
    }
}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) field: Option<&'static str>,
    pub(crate) message: Message,
}

/// A user-facing message in both dashboard languages.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    pub(crate) ar: &'static str,
    pub(crate) en: &'static str,
}

impl Message {
    const CHECK_FIELDS: Message = Message::new("يرجى مراجعة الحقول المطلوبة", "Please check the required fields");

    const fn new(ar: &'static str, en: &'static str) -> Self {
        Message { ar, en }
    }

    fn for_error(error: &AdminError) -> Self {
        match error {
            AdminError::Validation(e) => match e.field {
                "title" => Message::new("يرجى إدخال العنوان بالعربية", "Please enter the Arabic title"),
                "course_id" => Message::new("يرجى اختيار الدورة", "Please select a course"),
                "order" => Message::new("يجب أن يكون الترتيب رقمًا موجبًا", "The order must be a positive number"),
                _ => Message::CHECK_FIELDS,
            },
            AdminError::Store(StoreError::NotFound { .. }) => {
                Message::new("لم يتم العثور على العنصر", "The item was not found")
            }
            AdminError::Unauthenticated => Message::new("يرجى تسجيل الدخول", "Please sign in"),
            AdminError::Forbidden { .. } => {
                Message::new("ليس لديك صلاحية الوصول", "You are not allowed to manage courses")
            }
            AdminError::Store(_) => Message::new("حدث خطأ، حاول مرة أخرى", "Something went wrong, please try again"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Context {
    Request,
    Identity,
    Courses,
    Course { id: String },
    CreateCourse,
    UpdateCourse { id: String },
    DeleteCourse { id: String },
    Videos { course: Option<String> },
    CreateVideo,
    UpdateVideo { id: String },
    DeleteVideo { id: String },
    Quizzes { course: Option<String> },
    CreateQuiz,
    UpdateQuiz { id: String },
    DeleteQuiz { id: String },
}

impl Context {
    pub fn identity() -> Context {
        Context::Identity
    }

    pub fn courses() -> Context {
        Context::Courses
    }

    pub fn course(id: String) -> Context {
        Context::Course { id }
    }

    pub fn create_course() -> Context {
        Context::CreateCourse
    }

    pub fn update_course(id: String) -> Context {
        Context::UpdateCourse { id }
    }

    pub fn delete_course(id: String) -> Context {
        Context::DeleteCourse { id }
    }

    pub fn videos(course: Option<String>) -> Context {
        Context::Videos { course }
    }

    pub fn create_video() -> Context {
        Context::CreateVideo
    }

    pub fn update_video(id: String) -> Context {
        Context::UpdateVideo { id }
    }

    pub fn delete_video(id: String) -> Context {
        Context::DeleteVideo { id }
    }

    pub fn quizzes(course: Option<String>) -> Context {
        Context::Quizzes { course }
    }

    pub fn create_quiz() -> Context {
        Context::CreateQuiz
    }

    pub fn update_quiz(id: String) -> Context {
        Context::UpdateQuiz { id }
    }

    pub fn delete_quiz(id: String) -> Context {
        Context::DeleteQuiz { id }
    }
}
