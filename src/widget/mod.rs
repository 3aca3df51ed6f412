pub mod viewer_view;
