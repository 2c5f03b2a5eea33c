//backend.rs

use glam::Mat4;
use crate::common::{Color, MeshData};

/// Opaque id for a mesh living on the render side.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct MeshHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawStyle {
    Solid,
    Wireframe,
}

/// The only surface scenes use to reach the GPU.
pub trait RenderBackend {
    /// Takes ownership of the CPU copy; it is dropped after upload.
    fn upload_mesh(&mut self, mesh: MeshData) -> MeshHandle;
    fn release_mesh(&mut self, handle: MeshHandle);
    fn draw_mesh(&mut self, handle: MeshHandle, transform: Mat4, tint: Color, style: DrawStyle);
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use super::*;

    /// Keeps uploads in memory so scene lifecycles can be checked without a GPU.
    #[derive(Default)]
    pub struct RecordingBackend {
        next_id: u32,
        pub live: HashMap<MeshHandle, MeshData>,
        pub uploads: usize,
        pub releases: usize,
        pub draws: Vec<(MeshHandle, Mat4, Color, DrawStyle)>,
    }

    impl RecordingBackend {
        pub fn mesh(&self, handle: MeshHandle) -> &MeshData {
            &self.live[&handle]
        }
    }

    impl RenderBackend for RecordingBackend {
        fn upload_mesh(&mut self, mesh: MeshData) -> MeshHandle {
            let handle = MeshHandle(self.next_id);
            self.next_id += 1;
            self.uploads += 1;
            self.live.insert(handle, mesh);
            handle
        }

        fn release_mesh(&mut self, handle: MeshHandle) {
            assert!(self.live.remove(&handle).is_some(), "double release of {handle:?}");
            self.releases += 1;
        }

        fn draw_mesh(&mut self, handle: MeshHandle, transform: Mat4, tint: Color, style: DrawStyle) {
            assert!(self.live.contains_key(&handle), "draw of released {handle:?}");
            self.draws.push((handle, transform, tint, style));
        }
    }
}
