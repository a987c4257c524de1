pub mod scene_pass;
pub mod variants;

/// One uniform buffer per draw call, grown to the draw list length and
/// rewritten every frame. Callers must drop any bind groups referencing
/// the old buffers after a reallocation.
pub struct UniformPool {
    label: &'static str,
    pub buffers: Vec<wgpu::Buffer>,
    size: u64,
}

impl UniformPool {
    pub fn new(label: &'static str, size: u64) -> Self {
        Self {
            label,
            buffers: Vec::new(),
            size,
        }
    }

    pub fn alloc_buffers(&mut self, count: usize, device: &wgpu::Device) {
        self.buffers.clear();
        for _ in 0..count {
            self.buffers.push(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: self.size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
    }

    pub fn update_uniform<T: bytemuck::Pod>(&self, index: usize, data: T, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffers[index], 0, bytemuck::bytes_of(&data));
    }
}
