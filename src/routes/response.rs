use serde::Serialize;

use crate::record::{Course, Quiz, Video};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Identity {
        email: String,
        display_name: Option<String>,
    },
    Courses {
        courses: Vec<Course>,
    },
    CourseDetail {
        course: Course,
        videos: Vec<Video>,
    },
    CourseSaved {
        course: Course,
        courses: Vec<Course>,
    },
    Videos {
        videos: Vec<Video>,
    },
    VideoSaved {
        video: Video,
        videos: Vec<Video>,
    },
    Quizzes {
        quizzes: Vec<Quiz>,
    },
    QuizSaved {
        quiz: Quiz,
        quizzes: Vec<Quiz>,
    },
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
}
