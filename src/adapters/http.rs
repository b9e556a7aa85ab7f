//! ESP-IDF HTTP server adapter.
//!
//! Registers the three control-surface routes and forwards every request
//! URI to [`ControlSurface::handle_uri`].  All routing decisions, status
//! codes and bodies come from the surface; this module only moves bytes.
//! Unregistered paths get the IDF server's own 404.

#[cfg(target_os = "espidf")]
mod server {
    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::Write;
    use esp_idf_svc::sys::EspError;
    use log::info;

    use crate::adapters::log_sink::LogEventSink;
    use crate::app::ports::{ActuatorSink, Clock};
    use crate::surface::ControlSurface;

    pub const ROUTES: [&str; 3] = ["/", "/sensor", "/control"];

    /// Start the server on `port`.  Keep the returned handle alive; dropping
    /// it stops the server.
    pub fn serve<A, C>(surface: ControlSurface<A, C>, port: u16) -> Result<EspHttpServer<'static>, EspError>
    where
        A: ActuatorSink + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let mut server = EspHttpServer::new(&Configuration {
            http_port: port,
            ..Default::default()
        })?;

        for route in ROUTES {
            let surface = surface.clone();
            server.fn_handler(route, Method::Get, move |req| {
                let reply = surface.handle_uri(req.uri(), &mut LogEventSink);
                let mut resp = req.into_response(reply.status, None, &[("Content-Type", reply.content_type)])?;
                resp.write_all(reply.body.as_bytes())
            })?;
        }

        info!("HTTP: control surface listening on :{}", port);
        Ok(server)
    }
}

#[cfg(target_os = "espidf")]
pub use server::serve;
