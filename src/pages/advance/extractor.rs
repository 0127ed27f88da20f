use crate::pages::{database, path_id};

use super::*;

impl FromRequest for advance::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let advance_id = path_id(&req, "advance_id")?;
            let db = database(&req)?;

            let Some(advance) = Advance::find_by_id(advance_id)
                .one(db.as_ref()).await
                .map_err(PayrollError::from)?
            else {
                return Err(PayrollError::NotFound("advance").into())
            };

            Ok(advance)
        })
    }
}
