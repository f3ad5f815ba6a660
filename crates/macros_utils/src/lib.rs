#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix_web;

/// Generate a `routes` function registering the listed handlers.
///
/// ```ignore
/// macros_utils::routes! {
///     route list_printers,
///     route create_printer,
/// }
///
/// App::new().service(web::scope("/api").configure(routes));
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $handler:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix_web::web::ServiceConfig) {
            $( cfg.service($handler); )*
        }
    };
}
