use std::collections::BTreeMap;

use actix_multipart::MultipartError;
use actix_multipart::form::MultipartForm;
use actix_session::{Session, SessionExt};
use actix_web::error::{InternalError, PayloadError};
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::IncomingFlashMessages;
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::domain::{Field, FieldValue};
use crate::forms::image::IMAGE_TOO_LARGE;
use crate::forms::main::{AddImageForm, UploadImageForm};
use crate::routes::{
    FlashNotifier, FormSession, ModalState, alert_level_to_str, redirect, render_template,
};
use crate::services::cache::ImageListCache;
use crate::services::form_state::{FieldErrors, FormController, FormState, UploadHooks};
use crate::services::ports::ImagesApi;
use crate::services::submission::{SubmissionHandler, SubmissionOutcome};
use crate::services::upload::{UPLOAD_FAILED, UploadService};

#[derive(Deserialize)]
struct IndexQueryParams {
    modal: Option<String>,
}

/// Form fields as rendered in the modal.
#[derive(Debug, Default, Serialize)]
struct FormView {
    title: String,
    description: String,
    image_name: Option<String>,
    preview_url: Option<String>,
    errors: BTreeMap<&'static str, String>,
}

impl FormView {
    fn from_session(state: &FormSession) -> Self {
        let mut errors = BTreeMap::new();
        if let Some(message) = &state.image_error {
            errors.insert(Field::Image.as_str(), message.clone());
        }

        Self {
            image_name: state.image.as_ref().map(|file| file.name.clone()),
            preview_url: state.upload.preview_url().map(str::to_string),
            errors,
            ..Self::default()
        }
    }

    fn rejected(state: &FormSession, form: &AddImageForm, field_errors: &FieldErrors) -> Self {
        let errors = field_errors
            .iter()
            .filter_map(|(field, error)| {
                error
                    .message
                    .as_deref()
                    .map(|message| (field.as_str(), message.to_string()))
            })
            .collect();

        Self {
            title: form.title.clone(),
            description: form.description.clone(),
            errors,
            ..Self::from_session(state)
        }
    }
}

async fn render_gallery(
    mut context: Context,
    api: &dyn ImagesApi,
    cache: &ImageListCache,
    modal_open: bool,
    form: &FormView,
) -> HttpResponse {
    let images = match cache.images(api).await {
        Ok(page) => page.data,
        Err(e) => {
            log::error!("Failed to load images: {e}");
            vec![]
        }
    };

    context.insert("images", &images);
    context.insert("modal_open", &modal_open);
    context.insert("form", form);

    render_template("main/index.html", &context)
}

#[get("/")]
pub async fn index(
    params: web::Query<IndexQueryParams>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    api: web::Data<dyn ImagesApi>,
    cache: web::Data<ImageListCache>,
) -> impl Responder {
    let alerts: Vec<_> = flash_messages
        .iter()
        .map(|f| (f.content(), alert_level_to_str(&f.level())))
        .collect();

    let mut context = Context::new();
    context.insert("alerts", &alerts);

    let state = FormSession::load(&session);
    let modal_open = params.modal.as_deref() == Some("add");

    render_gallery(
        context,
        api.get_ref(),
        cache.get_ref(),
        modal_open,
        &FormView::from_session(&state),
    )
    .await
}

#[post("/images/upload")]
pub async fn upload_image(
    session: Session,
    uploads: web::Data<UploadService>,
    MultipartForm(form): MultipartForm<UploadImageForm>,
) -> impl Responder {
    let mut state = FormSession::load(&session);
    let mut controller = FormController::for_add_image();

    match uploads.accept(form.image, &mut state.upload, &mut controller) {
        Ok(url) => log::info!("Image available at {url}"),
        Err(e) => log::warn!("Image upload rejected: {e}"),
    }

    state.image = controller
        .value(Field::Image)
        .and_then(FieldValue::first_file)
        .cloned();
    state.image_error = controller
        .current_errors()
        .message(Field::Image)
        .map(str::to_string);
    state.store(&session);

    redirect("/?modal=add")
}

/// Files the multipart extractor refuses never reach [`upload_image`]. The
/// previous selection is dropped and the modal shows the reason instead.
pub fn upload_error_handler(err: MultipartError, req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        MultipartError::Payload(PayloadError::Overflow) => IMAGE_TOO_LARGE,
        _ => UPLOAD_FAILED,
    };
    log::warn!("Image upload refused: {err}");

    let session = req.get_session();
    let mut state = FormSession::load(&session);
    state.upload.reset();
    state.image = None;
    state.image_error = Some(message.to_string());
    state.store(&session);

    InternalError::from_response(err, redirect("/?modal=add")).into()
}

#[post("/images")]
pub async fn create_image(
    session: Session,
    api: web::Data<dyn ImagesApi>,
    cache: web::Data<ImageListCache>,
    web::Form(form): web::Form<AddImageForm>,
) -> impl Responder {
    let mut state = FormSession::load(&session);
    let mut controller = FormController::for_add_image();
    if let Some(file) = state.image.clone() {
        controller.set_value(Field::Image, FieldValue::Files(vec![file]));
    }
    for (field, value) in form.values() {
        controller.set_value(field, value);
    }

    let notifier = FlashNotifier;
    let handler = SubmissionHandler::new(api.get_ref(), cache.get_ref(), &notifier);
    let mut modal = ModalState::open();
    let outcome = handler
        .handle_submit(&mut controller, &mut state.upload, &mut modal)
        .await;

    if let SubmissionOutcome::BlockedByValidation(errors) = outcome {
        log::info!("Add-image form rejected: {}", errors.to_validation_errors());
        state.image_error = errors.message(Field::Image).map(str::to_string);
        state.store(&session);

        let mut context = Context::new();
        context.insert("alerts", &Vec::<(String, String)>::new());
        return render_gallery(
            context,
            api.get_ref(),
            cache.get_ref(),
            true,
            &FormView::rejected(&state, &form, &errors),
        )
        .await;
    }

    state.image = None;
    state.image_error = None;
    state.store(&session);

    redirect("/")
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use actix_multipart::form::MultipartFormConfig;
    use actix_multipart::test::create_form_data_payload_and_headers;
    use actix_session::SessionMiddleware;
    use actix_session::storage::CookieSessionStore;
    use actix_web::cookie::{Cookie, Key};
    use actix_web::dev::ServiceResponse;
    use actix_web::http::{StatusCode, header};
    use actix_web::web::Bytes;
    use actix_web::{App, test};
    use actix_web_flash_messages::FlashMessagesFramework;
    use actix_web_flash_messages::storage::CookieMessageStore;
    use async_trait::async_trait;
    use tempfile::tempdir;

    use super::*;
    use crate::domain::{ImagePage, ImageRecord, ImageSubmission, UploadRoot};
    use crate::services::ports::{ApiError, ApiResult};

    #[derive(Default)]
    struct RecordingApi {
        fail: bool,
        created: Mutex<Vec<ImageSubmission>>,
    }

    #[async_trait]
    impl ImagesApi for RecordingApi {
        async fn create(&self, submission: &ImageSubmission) -> ApiResult<()> {
            self.created.lock().unwrap().push(submission.clone());
            if self.fail {
                return Err(ApiError::Status(500));
            }
            Ok(())
        }

        async fn list(&self) -> ApiResult<ImagePage> {
            Ok(ImagePage {
                data: vec![ImageRecord {
                    id: None,
                    title: "Sunset".into(),
                    description: "Orange sky".into(),
                    url: "https://cdn/sunset.png".into(),
                }],
                after: None,
            })
        }
    }

    /// Cookies the browser would send back on the next request.
    #[derive(Default)]
    struct CookieJar(Vec<Cookie<'static>>);

    impl CookieJar {
        fn update<B>(&mut self, resp: &ServiceResponse<B>) {
            for cookie in resp.response().cookies() {
                self.0.retain(|kept| kept.name() != cookie.name());
                if !cookie.value().is_empty() {
                    self.0.push(cookie.into_owned());
                }
            }
        }

        fn attach(&self, mut req: test::TestRequest) -> test::TestRequest {
            for cookie in &self.0 {
                req = req.cookie(cookie.clone());
            }
            req
        }
    }

    fn uploads(root: PathBuf) -> UploadService {
        UploadService::new(UploadRoot::from(root), "https://cdn.example/")
    }

    fn upload_request(name: &str, size: usize) -> test::TestRequest {
        let (body, headers) = create_form_data_payload_and_headers(
            "image",
            Some(name.to_string()),
            "image/png".parse().ok(),
            Bytes::from(vec![0u8; size]),
        );
        let mut req = test::TestRequest::post().uri("/images/upload");
        for (name, value) in headers.iter() {
            req = req.insert_header((name.clone(), value.clone()));
        }
        req.set_payload(body)
    }

    fn location<B>(resp: &ServiceResponse<B>) -> &str {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    macro_rules! init_app {
        ($api:expr, $uploads:expr, $multipart:expr) => {{
            let key = Key::from(&[7u8; 64]);
            let api: Arc<dyn ImagesApi> = $api;
            test::init_service(
                App::new()
                    .wrap(
                        FlashMessagesFramework::builder(
                            CookieMessageStore::builder(key.clone()).build(),
                        )
                        .build(),
                    )
                    .wrap(SessionMiddleware::new(CookieSessionStore::default(), key))
                    .app_data(web::Data::from(api))
                    .app_data(web::Data::new(ImageListCache::default()))
                    .app_data(web::Data::new($uploads))
                    .app_data($multipart.error_handler(upload_error_handler))
                    .service(index)
                    .service(upload_image)
                    .service(create_image),
            )
            .await
        }};
        ($api:expr, $uploads:expr) => {
            init_app!($api, $uploads, MultipartFormConfig::default())
        };
    }

    macro_rules! send {
        ($app:expr, $jar:expr, $req:expr) => {{
            let resp = test::call_service(&$app, $jar.attach($req).to_request()).await;
            $jar.update(&resp);
            resp
        }};
    }

    async fn body_of<B: actix_web::body::MessageBody>(resp: ServiceResponse<B>) -> String {
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn index_lists_images_and_opens_modal() {
        let dir = tempdir().unwrap();
        let app = init_app!(Arc::new(RecordingApi::default()), uploads(dir.path().into()));

        let req = test::TestRequest::get().uri("/?modal=add").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_of(resp).await;
        assert!(body.contains("Sunset"));
        assert!(body.contains("Título da imagem..."));
    }

    #[actix_web::test]
    async fn submit_without_selected_file_shows_field_errors() {
        let dir = tempdir().unwrap();
        let api = Arc::new(RecordingApi::default());
        let app = init_app!(api.clone(), uploads(dir.path().into()));

        let req = test::TestRequest::post()
            .uri("/images")
            .set_form([("title", "Cat"), ("description", "x".repeat(70).as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_of(resp).await;
        assert!(body.contains("Arquivo obrigatório"));
        assert!(body.contains("Máximo de 65 caracteres"));
        assert!(api.created.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn upload_then_submit_registers_image() {
        let dir = tempdir().unwrap();
        let api = Arc::new(RecordingApi::default());
        let app = init_app!(api.clone(), uploads(dir.path().join("images")));
        let mut jar = CookieJar::default();

        let resp = send!(app, jar, upload_request("cat.png", 1_024));
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/?modal=add");
        assert_eq!(fs::read_dir(dir.path().join("images")).unwrap().count(), 1);

        let resp = send!(app, jar, test::TestRequest::get().uri("/?modal=add"));
        assert!(body_of(resp).await.contains(r#"alt="cat.png""#));

        let resp = send!(
            app,
            jar,
            test::TestRequest::post()
                .uri("/images")
                .set_form([("title", "Cat"), ("description", "A cat")])
        );
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
        {
            let created = api.created.lock().unwrap();
            assert_eq!(created.len(), 1);
            assert_eq!(created[0].title, "Cat");
            assert_eq!(created[0].description, "A cat");
            assert!(created[0].url.starts_with("https://cdn.example/upload/"));
            assert!(created[0].url.ends_with(".png"));
        }

        let resp = send!(app, jar, test::TestRequest::get().uri("/"));
        assert!(body_of(resp).await.contains("Imagem cadastrada."));

        let resp = send!(app, jar, test::TestRequest::get().uri("/?modal=add"));
        let body = body_of(resp).await;
        assert!(!body.contains(r#"alt="cat.png""#));
        assert!(!body.contains("Imagem cadastrada."));
    }

    #[actix_web::test]
    async fn submit_after_failed_store_warns_about_missing_upload() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, b"not a directory").unwrap();
        let api = Arc::new(RecordingApi::default());
        let app = init_app!(api.clone(), uploads(blocker));
        let mut jar = CookieJar::default();

        let resp = send!(app, jar, upload_request("cat.png", 1_024));
        assert_eq!(location(&resp), "/?modal=add");

        let resp = send!(app, jar, test::TestRequest::get().uri("/?modal=add"));
        assert!(body_of(resp).await.contains(UPLOAD_FAILED));

        let resp = send!(
            app,
            jar,
            test::TestRequest::post()
                .uri("/images")
                .set_form([("title", "Cat"), ("description", "A cat")])
        );
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
        assert!(api.created.lock().unwrap().is_empty());

        let resp = send!(app, jar, test::TestRequest::get().uri("/"));
        assert!(body_of(resp).await.contains("Imagem não adicionada."));
    }

    #[actix_web::test]
    async fn failed_create_reports_error_and_clears_form() {
        let dir = tempdir().unwrap();
        let api = Arc::new(RecordingApi {
            fail: true,
            ..RecordingApi::default()
        });
        let app = init_app!(api.clone(), uploads(dir.path().join("images")));
        let mut jar = CookieJar::default();

        send!(app, jar, upload_request("cat.png", 1_024));
        let resp = send!(
            app,
            jar,
            test::TestRequest::post()
                .uri("/images")
                .set_form([("title", "Cat"), ("description", "A cat")])
        );
        assert_eq!(location(&resp), "/");
        assert_eq!(api.created.lock().unwrap().len(), 1);

        let resp = send!(app, jar, test::TestRequest::get().uri("/"));
        assert!(body_of(resp).await.contains("Falha no cadastro"));

        let resp = send!(app, jar, test::TestRequest::get().uri("/?modal=add"));
        assert!(!body_of(resp).await.contains(r#"alt="cat.png""#));
    }

    #[actix_web::test]
    async fn oversized_upload_shows_size_message() {
        let dir = tempdir().unwrap();
        let app = init_app!(
            Arc::new(RecordingApi::default()),
            uploads(dir.path().join("images")),
            MultipartFormConfig::default().total_limit(1_024)
        );
        let mut jar = CookieJar::default();

        send!(app, jar, upload_request("cat.png", 100));
        let resp = send!(app, jar, upload_request("huge.png", 4_096));
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/?modal=add");

        let resp = send!(app, jar, test::TestRequest::get().uri("/?modal=add"));
        let body = body_of(resp).await;
        assert!(body.contains(IMAGE_TOO_LARGE));
        assert!(!body.contains(r#"alt="cat.png""#));
    }
}
