pub mod colormap;
pub mod heatmap;
