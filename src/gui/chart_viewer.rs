//! Chart Viewer Window
//! Native window showing the written figure, scaled to the available space.
//! Closing the window (or pressing Escape) ends the blocking display.

use egui::{CentralPanel, Color32, ColorImage, RichText, TextureHandle, TextureOptions};
use image::RgbaImage;

/// Largest texture side we upload; egui backends guarantee at least this much.
pub const MAX_TEXTURE_SIDE: u32 = 2048;

/// eframe application displaying a single decoded image.
pub struct ChartViewer {
    /// Pixels waiting to be uploaded on the first frame
    pending: Option<ColorImage>,
    texture: Option<TextureHandle>,
    caption: String,
}

impl ChartViewer {
    pub fn new(image: &RgbaImage, caption: impl Into<String>) -> Self {
        let size = [image.width() as usize, image.height() as usize];
        Self {
            pending: Some(ColorImage::from_rgba_unmultiplied(size, image.as_raw())),
            texture: None,
            caption: caption.into(),
        }
    }

    fn texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        if let Some(image) = self.pending.take() {
            self.texture = Some(ctx.load_texture("figure", image, TextureOptions::LINEAR));
        }
        self.texture.as_ref()
    }
}

impl eframe::App for ChartViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let caption = self.caption.clone();
        let texture = self.texture(ctx).cloned();

        CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::WHITE))
            .show(ctx, |ui| {
                ui.label(RichText::new(caption).size(12.0).color(Color32::DARK_GRAY));
                if let Some(texture) = texture {
                    ui.centered_and_justified(|ui| {
                        ui.add(
                            egui::Image::new(&texture)
                                .max_size(ui.available_size())
                                .maintain_aspect_ratio(true),
                        );
                    });
                }
            });
    }
}
