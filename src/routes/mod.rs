pub mod transport_routes;
