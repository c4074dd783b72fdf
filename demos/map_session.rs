//! Headless walk-through of the map session lifecycle: an in-memory image
//! surface "loads", markers are projected, then the window shrinks and the
//! session re-projects them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campuscard_http::{
    geometry::Marker,
    session::{
        ElementResizeEvents, ImageSurface, MapView, MarkerRenderer, SessionOptions,
    },
    PositionedMarker, RenderSurface,
};

struct DemoSurface {
    dims: Mutex<RenderSurface>,
}

#[async_trait]
impl ImageSurface for DemoSurface {
    fn measure(&self) -> RenderSurface {
        *self.dims.lock().unwrap()
    }

    fn is_complete(&self) -> bool {
        true
    }

    async fn loaded(&self) -> Result<(), String> {
        Ok(())
    }

    async fn layout_tick(&self) {}

    fn request_reload(&self) {}
}

struct StdoutRenderer;

impl MarkerRenderer for StdoutRenderer {
    fn render(&self, markers: &[PositionedMarker]) {
        for marker in markers {
            println!(
                "  {} at ({}, {}){}",
                marker.marker.name.as_deref().unwrap_or("<unnamed>"),
                marker.x,
                marker.y,
                if marker.out_of_bounds { "  [off-screen]" } else { "" },
            );
        }
    }

    fn clear(&self) {
        println!("-- cleared --");
    }

    fn show_error(&self, message: &str) {
        eprintln!("map error: {message}");
    }
}

#[tokio::main]
async fn main() {
    let surface = Arc::new(DemoSurface {
        dims: Mutex::new(RenderSurface::new(1200, 900, 600, 450)),
    });
    let (resize_tx, resize_events) = ElementResizeEvents::channel(8);

    let markers = vec![
        Marker::new(420.0, 180.0).with_name("library"),
        Marker::new(400.0, 150.0).with_name("north kiosk"),
    ];

    let mut view = MapView::new();
    view.begin_session(
        markers,
        surface.clone(),
        Arc::new(StdoutRenderer),
        Box::new(resize_events),
        SessionOptions::default(),
    );

    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("window shrinks...");
    *surface.dims.lock().unwrap() = RenderSurface::new(1200, 900, 300, 225);
    resize_tx.send(()).await.expect("session is observing");

    tokio::time::sleep(Duration::from_millis(300)).await;
    view.end_session();
}
