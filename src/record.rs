use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StoreError;
use crate::ordering::{Child, Ordered};
use crate::store::{Collection, Document, Fields};

/// A title in the primary (Arabic) and secondary (English) languages.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LocalizedTitle {
    #[serde(rename = "ar", default)]
    pub primary: String,

    #[serde(rename = "en", default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl LocalizedTitle {
    pub fn new(primary: impl Into<String>, secondary: Option<String>) -> Self {
        LocalizedTitle {
            primary: primary.into(),
            secondary,
        }
    }
}

/// A course. Videos and quizzes refer to it by ID.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Course {
    pub id: String,
    pub title: LocalizedTitle,
    pub description: String,
    pub instructor: String,
    pub image_url: Option<String>,
}

/// A video lesson of a course.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Video {
    pub id: String,

    /// The course this video is listed under. Videos created before
    /// courses existed have none.
    pub course_id: Option<String>,

    pub title: LocalizedTitle,

    /// The rank among the course's videos. Not necessarily unique.
    pub order: Option<i64>,

    /// The canonical YouTube video ID.
    pub youtube_id: Option<String>,
}

/// A quiz attached to a course.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quiz {
    pub id: String,
    pub course_id: Option<String>,
    pub title: LocalizedTitle,
    pub questions: Vec<Value>,
}

/// The submitted fields of a course form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseDraft {
    #[serde(default)]
    pub title: LocalizedTitle,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// The submitted fields of a video form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoDraft {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub title: LocalizedTitle,

    /// An explicit rank. When absent the video is placed after its
    /// siblings.
    #[serde(default)]
    pub order: Option<i64>,

    /// A video ID or link in any of the shapes `reference::normalize`
    /// understands.
    #[serde(default)]
    pub youtube_id: Option<String>,
}

/// The submitted fields of a quiz form.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizDraft {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub title: LocalizedTitle,
    #[serde(default)]
    pub questions: Vec<Value>,
}

/// A record kind stored as documents of one collection.
pub trait Record: Sized {
    const COLLECTION: Collection;

    fn from_document(document: Document) -> Result<Self, StoreError>;

    fn to_fields(&self) -> Fields;
}

impl Record for Course {
    const COLLECTION: Collection = Collection::Courses;

    fn from_document(document: Document) -> Result<Self, StoreError> {
        let reader = Reader::new(Self::COLLECTION, &document);

        Ok(Course {
            title: LocalizedTitle::new(
                reader.string("titleAr")?.unwrap_or_default(),
                reader.string("titleEn")?,
            ),
            description: reader.string("descriptionAr")?.unwrap_or_default(),
            instructor: reader.string("instructor")?.unwrap_or_default(),
            image_url: reader.string("imageUrl")?,
            id: document.id,
        })
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("titleAr".into(), self.title.primary.clone().into());
        fields.insert("titleEn".into(), text_or_empty(&self.title.secondary));
        fields.insert("descriptionAr".into(), self.description.clone().into());
        fields.insert("instructor".into(), self.instructor.clone().into());
        fields.insert("imageUrl".into(), text_or_empty(&self.image_url));
        fields
    }
}

impl Record for Video {
    const COLLECTION: Collection = Collection::Videos;

    fn from_document(document: Document) -> Result<Self, StoreError> {
        let reader = Reader::new(Self::COLLECTION, &document);

        Ok(Video {
            course_id: reader.string("courseId")?,
            title: LocalizedTitle::new(
                reader.string("title_ar")?.unwrap_or_default(),
                reader.string("title_en")?,
            ),
            order: reader.order("order"),
            youtube_id: reader.string("youtubeId")?,
            id: document.id,
        })
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title_ar".into(), self.title.primary.clone().into());
        fields.insert("title_en".into(), text_or_empty(&self.title.secondary));
        fields.insert("courseId".into(), text_or_empty(&self.course_id));
        fields.insert("order".into(), self.order.map_or(Value::Null, Value::from));
        fields.insert("youtubeId".into(), text_or_empty(&self.youtube_id));
        fields
    }
}

impl Record for Quiz {
    const COLLECTION: Collection = Collection::Quizzes;

    fn from_document(document: Document) -> Result<Self, StoreError> {
        let reader = Reader::new(Self::COLLECTION, &document);

        Ok(Quiz {
            course_id: reader.string("courseId")?,
            title: LocalizedTitle::new(
                reader.string("title_ar")?.unwrap_or_default(),
                reader.string("title_en")?,
            ),
            questions: reader.array("questions")?,
            id: document.id,
        })
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("courseId".into(), text_or_empty(&self.course_id));
        fields.insert("title_ar".into(), self.title.primary.clone().into());
        fields.insert("title_en".into(), text_or_empty(&self.title.secondary));
        fields.insert("questions".into(), Value::Array(self.questions.clone()));
        fields
    }
}

impl Ordered for Video {
    fn order(&self) -> Option<i64> {
        self.order
    }
}

impl Child for Video {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.course_id.as_deref()
    }
}

// quizzes keep the order the store returns them in
impl Ordered for Quiz {
    fn order(&self) -> Option<i64> {
        None
    }
}

impl Child for Quiz {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.course_id.as_deref()
    }
}

fn text_or_empty(text: &Option<String>) -> Value {
    Value::String(text.clone().unwrap_or_default())
}

/// Typed access to the fields of a stored document.
struct Reader<'a> {
    collection: Collection,
    document: &'a Document,
}

impl<'a> Reader<'a> {
    fn new(collection: Collection, document: &'a Document) -> Self {
        Reader {
            collection,
            document,
        }
    }

    /// Reads a text field. Missing, null and empty fields are all absent.
    fn string(&self, field: &'static str) -> Result<Option<String>, StoreError> {
        match self.document.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.malformed(field)),
        }
    }

    fn array(&self, field: &'static str) -> Result<Vec<Value>, StoreError> {
        match self.document.fields.get(field) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(values)) => Ok(values.clone()),
            Some(_) => Err(self.malformed(field)),
        }
    }

    /// Reads a rank. Earlier tooling stored ranks both as numbers and
    /// as numeric strings; anything else counts as no rank.
    fn order(&self, field: &'static str) -> Option<i64> {
        match self.document.fields.get(field)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn malformed(&self, field: &'static str) -> StoreError {
        StoreError::MalformedDocument {
            collection: self.collection,
            id: self.document.id.clone(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn videos_read_legacy_documents() {
        let video = Video::from_document(document(
            "v1",
            json!({ "title_ar": "مقدمة", "order": "3", "youtubeId": "" }),
        ))
        .expect("decode video");

        assert_eq!(video.id, "v1");
        assert_eq!(video.course_id, None);
        assert_eq!(video.title, LocalizedTitle::new("مقدمة", None));
        assert_eq!(video.order, Some(3));
        assert_eq!(video.youtube_id, None);
    }

    #[test]
    fn unreadable_orders_count_as_absent() {
        for order in &[json!(null), json!("first"), json!(true), json!([1])] {
            let video = Video::from_document(document("v", json!({ "title_ar": "x", "order": order })))
                .expect("decode video");

            assert_eq!(video.order, None, "{}", order);
        }
    }

    #[test]
    fn mistyped_fields_are_reported() {
        let error = Course::from_document(document("c1", json!({ "titleAr": 5 })))
            .expect_err("decode course");

        match error {
            StoreError::MalformedDocument { collection, id, field } => {
                assert_eq!(collection, Collection::Courses);
                assert_eq!(id, "c1");
                assert_eq!(field, "titleAr");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn courses_use_the_stored_field_names() {
        let course = Course {
            id: "c1".into(),
            title: LocalizedTitle::new("الفقه", Some("Fiqh".into())),
            description: "وصف".into(),
            instructor: "Shaykh".into(),
            image_url: None,
        };

        assert_eq!(
            Value::Object(course.to_fields()),
            json!({
                "titleAr": "الفقه",
                "titleEn": "Fiqh",
                "descriptionAr": "وصف",
                "instructor": "Shaykh",
                "imageUrl": "",
            })
        );
    }

    #[test]
    fn quizzes_keep_their_questions() {
        let quiz = Quiz::from_document(document(
            "q1",
            json!({ "courseId": "C1", "title_ar": "اختبار", "questions": [{ "text": "?" }] }),
        ))
        .expect("decode quiz");

        assert_eq!(quiz.course_id.as_deref(), Some("C1"));
        assert_eq!(quiz.questions, vec![json!({ "text": "?" })]);
    }
}
