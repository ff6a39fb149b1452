//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module ([`crate::checkout`] and
//! [`crate::webhook`] are the substantial ones). Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the ledger backend trait, so endpoint tests can run them against a mocked
//! repository. Actix cannot register generic handlers directly, which is what the `route!` macro is for.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use mandi_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    traits::LedgerDatabase,
    LedgerApi,
};

use crate::{
    auth::Principal,
    data_objects::FulfilmentUpdate,
    errors::ServerError,
};

// Actix cannot handle generics in handlers, so the service struct is generated manually per handler
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_by_id => Get "/orders/{id}" impl LedgerDatabase);
pub async fn order_by_id<B: LedgerDatabase>(
    principal: Principal,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ GET order {order_id} for {}", principal.user_id);
    let order = api.order(&order_id).await?;
    if !principal.may_view(&order) {
        return Err(ServerError::InsufficientPermissions(format!("{} is not a party to {order_id}", principal.user_id)));
    }
    Ok(HttpResponse::Ok().json(order))
}

route!(abandon_order => Post "/orders/{id}/abandon" impl LedgerDatabase);
/// Vendor walks away from checkout before paying. A payment that settles anyway later will surface as a
/// conflict in the webhook path, not silently re-confirm the order.
pub async fn abandon_order<B: LedgerDatabase>(
    principal: Principal,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ POST abandon {order_id} by {}", principal.user_id);
    let order = api.order(&order_id).await?;
    if !principal.is_order_vendor(&order) {
        return Err(ServerError::InsufficientPermissions(format!(
            "Only the ordering vendor can abandon {order_id}"
        )));
    }
    let order = api.abandon_checkout(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_fulfilment => Post "/orders/{id}/fulfilment" impl LedgerDatabase);
/// Supplier-side fulfilment progression. The ledger refuses any step on an order whose payment has not
/// settled, so no role or ordering mistake can ship an unpaid order.
pub async fn update_fulfilment<B: LedgerDatabase>(
    principal: Principal,
    path: web::Path<String>,
    body: web::Json<FulfilmentUpdate>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let FulfilmentUpdate { status } = body.into_inner();
    debug!("💻️ POST fulfilment {order_id} -> {status} by {}", principal.user_id);
    let order = api.order(&order_id).await?;
    if !principal.is_order_supplier(&order) {
        return Err(ServerError::InsufficientPermissions(format!(
            "Only the fulfilling supplier can update {order_id}"
        )));
    }
    if matches!(status, OrderStatusType::Pending | OrderStatusType::Cancelled | OrderStatusType::Confirmed) {
        return Err(ServerError::ValidationError(format!("{status} is not a fulfilment step")));
    }
    let order = api.update_fulfilment(&order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}
