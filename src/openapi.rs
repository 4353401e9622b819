use utoipa::OpenApi;

use crate::api;
use crate::records::SettingsPatch;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health,
        api::upload_template,
        api::upload_photos,
        api::list_photos,
        api::load_records,
        api::list_records,
        api::compose_all,
        api::compose_one,
        api::update_settings,
        api::swap_photo,
        api::set_approved,
        api::record_image,
        api::download_bundle,
    ),
    components(schemas(
        api::HealthResponse,
        api::CountResponse,
        api::RecordSummary,
        api::SwapPhotoRequest,
        api::ApproveRequest,
        SettingsPatch,
    )),
    tags((name = "cardgen", description = "Catalog card composition API"))
)]
pub struct ApiDoc;
