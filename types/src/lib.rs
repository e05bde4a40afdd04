pub mod api;
pub mod combined;
pub mod config;
pub mod misc;
pub mod nonstandard;

pub mod phase0 {
    pub mod consts;
    pub mod containers;
    pub mod primitives;
}

pub mod bellatrix {
    pub mod containers;
}
