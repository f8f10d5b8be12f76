//! Scene and texture fixtures.
//!
//! Every source tile is a solid color derived from its UDIM number, so a
//! pixel sampled from a destination image tells which source tile it came
//! from.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use udimpack_spec::{
    Colorspace, ImageEntry, LinkSpec, MaterialEntry, NodeKind, NodeSpec, ObjectEntry, TileIndex,
    UDIM_MARKER,
};

/// Edge length of generated source tiles.
pub const TILE_SIZE: u32 = 16;

/// Distinct opaque color for a UDIM tile.
pub fn tile_color(udim: u32) -> [u8; 4] {
    let i = udim - 1000;
    [
        (i * 17 % 256) as u8,
        (255 - i * 29 % 256) as u8,
        (i * 53 % 256) as u8,
        255,
    ]
}

/// Writes `<dir>/<stem>.<udim>.png` filled with `color`.
pub fn write_solid_tile(dir: &Path, stem: &str, udim: u32, size: u32, color: [u8; 4]) -> PathBuf {
    let path = dir.join(format!("{}.{}.png", stem, udim));
    RgbaImage::from_pixel(size, size, Rgba(color))
        .save(&path)
        .expect("Failed to write tile");
    path
}

/// Writes one [`tile_color`] tile per UDIM and returns the `<UDIM>` pattern.
pub fn write_udim_set(dir: &Path, stem: &str, udims: &[u32]) -> String {
    for &udim in udims {
        write_solid_tile(dir, stem, udim, TILE_SIZE, tile_color(udim));
    }
    dir.join(format!("{}.{}.png", stem, UDIM_MARKER))
        .to_string_lossy()
        .into_owned()
}

pub fn tiled_image(name: &str, pattern: &str, colorspace: Colorspace) -> ImageEntry {
    ImageEntry {
        name: name.to_string(),
        path: pattern.to_string(),
        colorspace,
        colorspace_name: Some(
            match colorspace {
                Colorspace::Color => "sRGB",
                _ => "Non-Color",
            }
            .to_string(),
        ),
        tiled: true,
        tiles: Vec::new(),
    }
}

/// A principled shader with one image texture per `(socket, image)` pair.
pub fn principled_material(name: &str, inputs: &[(&str, &str)]) -> MaterialEntry {
    let mut nodes = vec![
        NodeSpec {
            id: "bsdf".to_string(),
            kind: NodeKind::Shader {
                shader: "principled_bsdf".to_string(),
            },
        },
        NodeSpec {
            id: "out".to_string(),
            kind: NodeKind::Output,
        },
    ];
    let mut links = vec![LinkSpec {
        from: "bsdf".to_string(),
        from_socket: "BSDF".to_string(),
        to: "out".to_string(),
        to_socket: "Surface".to_string(),
    }];
    for (i, (socket, image)) in inputs.iter().enumerate() {
        let id = format!("tex_{}", i);
        nodes.push(NodeSpec {
            id: id.clone(),
            kind: NodeKind::ImageTexture {
                image: Some(image.to_string()),
            },
        });
        links.push(LinkSpec {
            from: id,
            from_socket: "Color".to_string(),
            to: "bsdf".to_string(),
            to_socket: socket.to_string(),
        });
    }
    MaterialEntry {
        name: name.to_string(),
        nodes,
        links,
    }
}

/// An object whose UVs form a quad in the middle half of a tile.
pub fn object_on_tile(name: &str, udim: u32, materials: &[&str]) -> ObjectEntry {
    let [u0, v0] = TileIndex::from_udim(udim)
        .expect("valid UDIM")
        .origin();
    ObjectEntry {
        name: name.to_string(),
        uvs: Some(vec![
            [u0 + 0.25, v0 + 0.25],
            [u0 + 0.75, v0 + 0.25],
            [u0 + 0.75, v0 + 0.75],
            [u0 + 0.25, v0 + 0.75],
        ]),
        materials: materials.iter().map(|m| m.to_string()).collect(),
    }
}

/// Midpoint of an object's UV bounds.
pub fn uv_center(object: &ObjectEntry) -> [f64; 2] {
    let uvs = object.uvs.as_deref().expect("object has UVs");
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for uv in uvs {
        for axis in 0..2 {
            min[axis] = min[axis].min(uv[axis]);
            max[axis] = max[axis].max(uv[axis]);
        }
    }
    [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0]
}
