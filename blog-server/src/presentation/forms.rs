use std::collections::{BTreeMap, HashMap};

use actix_multipart::Multipart;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::post::{Post, PostDraft};
use crate::domain::user::{ProfileUpdate, User};
use crate::infrastructure::media::{MediaStorage, UploadedFile};

const MAX_TITLE_LEN: usize = 256;
const MAX_USERNAME_LEN: usize = 150;
const MAX_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;

const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];
const DATETIME_WIDGET_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Field name → message, rendered next to the offending input.
#[derive(Debug, Clone, Default)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are accepted as redirect targets.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    next.map(str::trim)
        .filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
        .map(str::to_string)
}

// ======================= POSTS =======================

/// Text fields and files of a multipart body.
#[derive(Debug, Default)]
pub struct MultipartData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

/// Reads a multipart body. File parts larger than `file_limit` are cut one
/// chunk past the limit so validation can still report them. A text field
/// larger than `file_limit` fails the whole request.
pub async fn collect_multipart(
    mut payload: Multipart,
    file_limit: usize,
) -> Result<MultipartData, DomainError> {
    let mut data = MultipartData::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| DomainError::BadRequest(e.to_string()))?
    {
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);
        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| DomainError::BadRequest(e.to_string()))?
        {
            push_chunk(&mut bytes, &chunk, filename.is_some(), file_limit, &name)?;
        }

        match filename {
            Some(filename) => {
                if !filename.is_empty() && !bytes.is_empty() {
                    data.files.insert(
                        name,
                        UploadedFile {
                            filename,
                            content_type,
                            bytes,
                        },
                    );
                }
            }
            None => {
                data.fields
                    .insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    }

    Ok(data)
}

fn push_chunk(
    bytes: &mut Vec<u8>,
    chunk: &[u8],
    is_file: bool,
    limit: usize,
    name: &str,
) -> Result<(), DomainError> {
    if !is_file && bytes.len() + chunk.len() > limit {
        return Err(DomainError::BadRequest(format!(
            "form field '{}' exceeds {} bytes",
            name, limit
        )));
    }
    if bytes.len() <= limit {
        bytes.extend_from_slice(chunk);
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub location: String,
    pub category: String,
    pub is_published: bool,
    pub clear_image: bool,
    pub image: Option<UploadedFile>,
    pub errors: FormErrors,
}

impl PostForm {
    pub fn blank() -> Self {
        Self {
            pub_date: Utc::now().format(DATETIME_WIDGET_FORMAT).to_string(),
            is_published: true,
            ..Self::default()
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date.format(DATETIME_WIDGET_FORMAT).to_string(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published,
            ..Self::default()
        }
    }

    /// Checkboxes count as ticked whenever they are present in the body.
    pub fn from_parts(mut data: MultipartData) -> Self {
        let mut take = |name: &str| data.fields.remove(name).unwrap_or_default();
        let title = take("title");
        let text = take("text");
        let pub_date = take("pub_date");
        let location = take("location");
        let category = take("category");
        let is_published = data.fields.contains_key("is_published");
        let clear_image = data.fields.contains_key("image-clear");

        Self {
            title,
            text,
            pub_date,
            location,
            category,
            is_published,
            clear_image,
            image: data.files.remove("image"),
            errors: FormErrors::default(),
        }
    }

    /// Returns the draft, or `None` with `errors` filled in.
    pub fn validate(
        &mut self,
        categories: &[Category],
        locations: &[Location],
        media: &MediaStorage,
    ) -> Option<PostDraft> {
        let mut errors = FormErrors::default();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        } else if title.chars().count() > MAX_TITLE_LEN {
            errors.add(
                "title",
                format!("Ensure this value has at most {MAX_TITLE_LEN} characters."),
            );
        }

        let text = self.text.trim().to_string();
        if text.is_empty() {
            errors.add("text", "This field is required.");
        }

        let pub_date = parse_datetime_local(&self.pub_date);
        if self.pub_date.trim().is_empty() {
            errors.add("pub_date", "This field is required.");
        } else if pub_date.is_none() {
            errors.add("pub_date", "Enter a valid date/time.");
        }

        let category_id = choice(&self.category, categories.iter().map(|c| c.id))
            .unwrap_or_else(|message| {
                errors.add("category", message);
                None
            });
        let location_id = choice(&self.location, locations.iter().map(|l| l.id))
            .unwrap_or_else(|message| {
                errors.add("location", message);
                None
            });

        if let Some(image) = &self.image {
            if let Err(message) = media.check_image(image) {
                errors.add("image", message);
            }
        }

        self.errors = errors;
        match pub_date {
            Some(pub_date) if self.errors.is_empty() => Some(PostDraft {
                title,
                text,
                pub_date,
                location_id,
                category_id,
                is_published: self.is_published,
            }),
            _ => None,
        }
    }
}

/// Empty selection is `None`; anything else must be one of `options`.
fn choice(raw: &str, mut options: impl Iterator<Item = Uuid>) -> Result<Option<Uuid>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = || "Select a valid choice.".to_string();
    let id = Uuid::parse_str(raw).map_err(|_| invalid())?;
    if options.any(|option| option == id) {
        Ok(Some(id))
    } else {
        Err(invalid())
    }
}

/// Parses the value of a `datetime-local` input as UTC.
pub fn parse_datetime_local(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

// ======================= COMMENTS =======================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

// ======================= USERS =======================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<&User> for ProfileRequest {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

impl ProfileRequest {
    pub fn validate(&self) -> Result<ProfileUpdate, FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();
        if let Err(message) = check_username(username) {
            errors.add("username", message);
        }
        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.trim().chars().count() > MAX_NAME_LEN {
                errors.add(
                    field,
                    format!("Ensure this value has at most {MAX_NAME_LEN} characters."),
                );
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProfileUpdate {
            username: username.to_string(),
            email: email.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Username, email and password of a valid registration.
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<Registration, FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();
        if let Err(message) = check_username(username) {
            errors.add("username", message);
        }
        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
        if self.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password1.clone(),
        })
    }
}

fn check_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field is required.".into());
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "Ensure this value has at most {MAX_USERNAME_LEN} characters."
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        );
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn media() -> MediaStorage {
        MediaStorage::new(std::env::temp_dir(), "/media".into(), 1024)
    }

    fn fields(pairs: &[(&str, &str)]) -> MultipartData {
        MultipartData {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    #[test]
    fn valid_post_form_produces_draft() {
        let category = Category::new("Travel".into(), String::new(), "travel".into(), true);
        let category_id = category.id.to_string();
        let mut form = PostForm::from_parts(fields(&[
            ("title", "  Hello  "),
            ("text", "Body"),
            ("pub_date", "2030-05-01T09:30"),
            ("category", category_id.as_str()),
            ("location", ""),
            ("is_published", "on"),
        ]));

        let draft = form.validate(&[category.clone()], &[], &media()).unwrap();
        assert_eq!(draft.title, "Hello");
        assert_eq!(draft.category_id, Some(category.id));
        assert_eq!(draft.location_id, None);
        assert!(draft.is_published);
        assert_eq!(draft.pub_date.year(), 2030);
        assert_eq!(draft.pub_date.hour(), 9);
    }

    #[test]
    fn missing_fields_are_reported() {
        let mut form = PostForm::from_parts(fields(&[("pub_date", "tomorrow")]));
        assert!(form.validate(&[], &[], &media()).is_none());
        assert!(form.errors.get("title").is_some());
        assert!(form.errors.get("text").is_some());
        assert_eq!(form.errors.get("pub_date"), Some("Enter a valid date/time."));
        assert!(!form.is_published);
    }

    #[test]
    fn unknown_category_is_invalid_choice() {
        let mut form = PostForm::from_parts(fields(&[
            ("title", "t"),
            ("text", "x"),
            ("pub_date", "2024-01-01 10:00"),
            ("category", Uuid::new_v4().to_string().as_str()),
        ]));
        assert!(form.validate(&[], &[], &media()).is_none());
        assert_eq!(form.errors.get("category"), Some("Select a valid choice."));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut data = fields(&[("title", "t"), ("text", "x"), ("pub_date", "2024-01-01T10:00")]);
        data.files.insert(
            "image".into(),
            UploadedFile {
                filename: "big.png".into(),
                content_type: "image/png".into(),
                bytes: vec![0; 2048],
            },
        );
        let mut form = PostForm::from_parts(data);
        assert!(form.validate(&[], &[], &media()).is_none());
        assert!(form.errors.get("image").is_some());
    }

    #[test]
    fn html_uploaded_as_png_is_an_image_error() {
        let mut data = fields(&[("title", "t"), ("text", "x"), ("pub_date", "2024-01-01T10:00")]);
        data.files.insert(
            "image".into(),
            crate::infrastructure::media::tests::upload(
                "image/png",
                b"<html><script>alert(1)</script></html>".to_vec(),
            ),
        );
        let mut form = PostForm::from_parts(data);
        assert!(form.validate(&[], &[], &media()).is_none());
        assert!(form.errors.get("image").unwrap().starts_with("Upload a valid image"));
    }

    #[test]
    fn text_chunks_past_limit_are_a_bad_request() {
        let mut bytes = b"12345678".to_vec();
        assert!(push_chunk(&mut bytes, b"90", false, 10, "text").is_ok());
        assert_eq!(bytes.len(), 10);

        let err = push_chunk(&mut bytes, b"!", false, 10, "text").unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
        assert_eq!(bytes.len(), 10);
    }

    #[test]
    fn file_chunks_past_limit_are_cut() {
        let mut bytes = Vec::new();
        for _ in 0..5 {
            push_chunk(&mut bytes, &[0; 4], true, 10, "image").unwrap();
        }
        assert_eq!(bytes.len(), 12);
    }

    fn multipart_body(title: &str) -> Multipart {
        use actix_web::error::PayloadError;
        use actix_web::http::header::{self, HeaderMap, HeaderValue};
        use actix_web::web::Bytes;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=blogicum"),
        );
        let body = format!(
            "--blogicum\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{}\r\n--blogicum--\r\n",
            title
        );
        let stream =
            futures_util::stream::once(async move { Ok::<_, PayloadError>(Bytes::from(body)) });
        Multipart::new(&headers, stream)
    }

    #[actix_web::test]
    async fn multipart_text_fields_are_collected() {
        let data = collect_multipart(multipart_body("Hello"), 64).await.unwrap();
        assert_eq!(data.fields.get("title").map(String::as_str), Some("Hello"));
        assert!(data.files.is_empty());
    }

    #[actix_web::test]
    async fn oversized_multipart_text_field_is_rejected() {
        let title = "a".repeat(100);
        let err = collect_multipart(multipart_body(&title), 64).await.unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    #[test]
    fn post_form_roundtrips_stored_post_date() {
        let mut draft = crate::domain::post::fixtures::draft();
        draft.pub_date = parse_datetime_local("2025-02-03T04:05").unwrap();
        let post = Post::new(Uuid::new_v4(), draft, None);
        let form = PostForm::from_post(&post);
        assert_eq!(form.pub_date, "2025-02-03T04:05");
        assert_eq!(parse_datetime_local(&form.pub_date), Some(post.pub_date));
    }

    #[test]
    fn profile_validation() {
        let ok = ProfileRequest {
            username: " anna.k ".into(),
            email: "anna@example.com".into(),
            first_name: "Anna".into(),
            last_name: String::new(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.username, "anna.k");

        let errors = ProfileRequest {
            username: "anna k".into(),
            email: "not-an-email".into(),
            ..ProfileRequest::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn registration_requires_matching_long_password() {
        let errors = RegisterRequest {
            username: "anna".into(),
            email: String::new(),
            password1: "short".into(),
            password2: "other".into(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("password1").is_some());
        assert!(errors.get("password2").is_some());

        let registration = RegisterRequest {
            username: "anna".into(),
            email: "anna@example.com".into(),
            password1: "long enough".into(),
            password2: "long enough".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(registration.password, "long enough");
    }

    #[test]
    fn next_must_be_local_path() {
        assert_eq!(safe_next(Some("/posts/1/")), Some("/posts/1/".into()));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil")), None);
        assert_eq!(safe_next(None), None);
    }
}
