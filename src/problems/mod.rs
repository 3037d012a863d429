pub mod grid_2d;
