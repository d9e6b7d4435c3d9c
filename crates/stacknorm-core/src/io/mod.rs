pub mod tiff_io;
