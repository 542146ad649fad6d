//! GPU backend kernels using WGPU.
//!
//! This module implements the floor-division family as compute shaders on
//! the GPU using WGPU + WGSL. It handles GPU context initialization, shader
//! precompilation (via `lazy_static`), and compute dispatch.
//!
//! All pipelines are compiled and cached once at first use. Array data is
//! copied to the GPU per call; the launch itself is asynchronous, and the
//! `pollster::block_on` around the shader run is the scoped synchronization
//! point, so results are host-visible when the kernel function returns.
//!
//! ## Transport widths
//!
//! WGSL has no 8/16/64-bit numeric buffers, so narrow types ride a wider
//! lossless transport: U8/U16 go through u32 storage, I16 through i32, and
//! F16/BF16 through f32 (promote, compute, demote — the same promotion the
//! CPU kernels use, which keeps the two backends bit-for-bit identical).
//! I64 and F64 are not registered here at all: there is no 64-bit transport
//! that preserves their values, and silently computing in a narrower type
//! would diverge from the CPU backend.
//!
//! ## Integer division by zero
//!
//! A shader cannot signal a per-element failure, so the divisor scan runs
//! host-side before the launch on both integer paths and fails the whole
//! call with `DivisionByZero` before any device work is submitted.

use briny::prelude::*;
use wgpu::util::DeviceExt;

use crate::arrays::Array;
use crate::backend::Backend;
use crate::dtype::ElementType;
use crate::error::{Error, Result};
use crate::ops::{FLOOR_DIV, FLOOR_DIV_REAL};
use crate::registry::KernelRegistry;

const FLOOR_DIV_I32_SRC: &str = include_str!("shaders/floor_div_i32.wgsl");
const FLOOR_DIV_U32_SRC: &str = include_str!("shaders/floor_div_u32.wgsl");
const FLOOR_DIV_F32_SRC: &str = include_str!("shaders/floor_div_f32.wgsl");

/// Basic wrapper for common GPU setup errors.
#[derive(Debug)]
pub enum GpuError {
    /// An error in requesting the adapter.
    Adapter(wgpu::RequestAdapterError),
    /// An error in requesting the GPU (device).
    Device(wgpu::RequestDeviceError),
    /// A shader failed validation.
    Shader(String),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::Adapter(e) => write!(f, "adapter error: {e}"),
            GpuError::Device(e) => write!(f, "device error: {e}"),
            GpuError::Shader(e) => write!(f, "shader error: {e}"),
        }
    }
}

impl From<GpuError> for Error {
    fn from(e: GpuError) -> Self {
        Error::Gpu(e.to_string())
    }
}

/// Secure wrapper for WGSL source code extracted from files.
pub struct WgslSource<'a>(pub &'a str);

impl<'a> Validate for WgslSource<'a> {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let src = self.0;

        if src.len() > 65536 {
            return Err(ValidationError);
        }

        if !src.contains("fn main") {
            return Err(ValidationError);
        }

        if src.contains("import") || src.contains("#include") {
            return Err(ValidationError); // Disallow source inclusion
        }

        let forbidden = ["asm", "unsafe", "ptr", "std::"];
        if forbidden.iter().any(|bad| src.contains(bad)) {
            return Err(ValidationError);
        }

        Ok(())
    }
}

/// Validates a WGSL shader and compiles it into a labeled module.
fn load_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> std::result::Result<wgpu::ShaderModule, GpuError> {
    WgslSource(source)
        .validate()
        .map_err(|_| GpuError::Shader(format!("{label} failed validation")))?;

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    }))
}

/// Holds the WGPU device, queue, and precompiled floor-division pipelines.
///
/// Initialized once globally and reused for all launches via `lazy_static`.
struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    bind_group_layout: wgpu::BindGroupLayout,
    floor_div_i32: wgpu::ComputePipeline,
    floor_div_u32: wgpu::ComputePipeline,
    floor_div_f32: wgpu::ComputePipeline,
}

impl GpuState {
    fn new() -> std::result::Result<Self, GpuError> {
        let instance = wgpu::Instance::default();
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .map_err(GpuError::Adapter)?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .map_err(GpuError::Device)?;

        // All three shaders share one layout: params uniform, two read-only
        // operand buffers, one writable output buffer.
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("floor_div_bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("floor_div_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline =
            |label: &str, source: &str| -> std::result::Result<wgpu::ComputePipeline, GpuError> {
                let module = load_shader(&device, label, source)?;
                Ok(
                    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                        label: Some(label),
                        layout: Some(&pipeline_layout),
                        module: &module,
                        entry_point: Some("main"),
                        cache: None,
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                )
            };

        let floor_div_i32 = make_pipeline("floor_div_i32", FLOOR_DIV_I32_SRC)?;
        let floor_div_u32 = make_pipeline("floor_div_u32", FLOOR_DIV_U32_SRC)?;
        let floor_div_f32 = make_pipeline("floor_div_f32", FLOOR_DIV_F32_SRC)?;

        Ok(Self {
            device,
            queue,
            bind_group_layout,
            floor_div_i32,
            floor_div_u32,
            floor_div_f32,
        })
    }
}

lazy_static::lazy_static! {
    static ref GPU: std::result::Result<GpuState, String> =
        GpuState::new().map_err(|e| e.to_string());
}

fn gpu() -> Result<&'static GpuState> {
    GPU.as_ref().map_err(|e| Error::Gpu(e.clone()))
}

fn as_bytes<T: Copy>(data: &[T]) -> &[u8] {
    let len = std::mem::size_of_val(data);
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, len) }
}

fn from_bytes<T: Copy>(data: &[u8]) -> Result<&[T]> {
    use std::mem::{align_of, size_of};

    if data.as_ptr() as usize % align_of::<T>() != 0 {
        return Err(Error::Gpu("unaligned staging buffer".into()));
    }
    if data.len() % size_of::<T>() != 0 {
        return Err(Error::Gpu(
            "staging buffer length is not a multiple of the element size".into(),
        ));
    }

    let len = data.len() / size_of::<T>();
    let ptr = data.as_ptr() as *const T;
    unsafe { Ok(std::slice::from_raw_parts(ptr, len)) }
}

/// Uploads both operands, launches one floor-division pipeline over the
/// flat index space, and reads the result back through a staging buffer.
async fn run_floor_div_shader<T: Copy>(
    state: &GpuState,
    pipeline: &wgpu::ComputePipeline,
    a: &[T],
    b: &[T],
    out: &mut [T],
) -> Result<()> {
    // Zero-size storage buffers fail wgpu validation, and the shader indexes
    // with a u32.
    if out.is_empty() {
        return Ok(());
    }
    let n = u32::try_from(out.len())
        .map_err(|_| Error::Gpu("array exceeds the 32-bit gpu index space".into()))?;

    let device = &state.device;
    let queue = &state.queue;

    let params = [n, 0u32, 0u32, 0u32];
    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("params"),
        contents: as_bytes(&params),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let a_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("lhs"),
        contents: as_bytes(a),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let b_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("rhs"),
        contents: as_bytes(b),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let out_size = std::mem::size_of_val(out) as u64;
    let out_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("out"),
        size: out_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("floor_div_bind_group"),
        layout: &state.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: a_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: b_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: out_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("floor_div_encoder"),
    });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("floor_div_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(n.div_ceil(64), 1, 1);
    }

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("floor_div_staging"),
        size: out_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    encoder.copy_buffer_to_buffer(&out_buffer, 0, &staging, 0, out_size);
    queue.submit(Some(encoder.finish()));

    staging.slice(..).map_async(wgpu::MapMode::Read, |_| {});
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| Error::Gpu(format!("poll failed: {e:?}")))?;

    let view = staging.slice(..).get_mapped_range();
    out.copy_from_slice(from_bytes(&view)?);
    drop(view);
    staging.unmap();

    Ok(())
}

fn gpu_floor_div_i32(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
    let a = lhs.as_slice::<i32>()?;
    let b = rhs.as_slice::<i32>()?;
    if b.iter().any(|&d| d == 0) {
        return Err(Error::DivisionByZero);
    }
    let o = out.as_mut_slice::<i32>()?;
    let state = gpu()?;
    log::debug!("gpu launch floor_div [i32], {} elements", o.len());
    pollster::block_on(run_floor_div_shader(state, &state.floor_div_i32, a, b, o))
}

fn gpu_floor_div_f32(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
    let a = lhs.as_slice::<f32>()?;
    let b = rhs.as_slice::<f32>()?;
    let o = out.as_mut_slice::<f32>()?;
    let state = gpu()?;
    log::debug!("gpu launch floor_div_real [f32], {} elements", o.len());
    pollster::block_on(run_floor_div_shader(state, &state.floor_div_f32, a, b, o))
}

macro_rules! gpu_floor_div_widened_int {
    ($fname:ident, $ty:ty, $wide:ty, $pipeline:ident, $op:expr) => {
        fn $fname(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
            let a: Vec<$wide> = lhs.as_slice::<$ty>()?.iter().map(|&v| v as $wide).collect();
            let b: Vec<$wide> = rhs.as_slice::<$ty>()?.iter().map(|&v| v as $wide).collect();
            if b.iter().any(|&d| d == 0) {
                return Err(Error::DivisionByZero);
            }
            let o = out.as_mut_slice::<$ty>()?;
            let mut wide_out = vec![0 as $wide; o.len()];
            let state = gpu()?;
            log::debug!(
                "gpu launch {} [{}], {} elements (via {})",
                $op,
                <$ty as crate::dtype::Scalar>::ELEM,
                o.len(),
                stringify!($wide)
            );
            pollster::block_on(run_floor_div_shader(
                state,
                &state.$pipeline,
                &a,
                &b,
                &mut wide_out,
            ))?;
            for (y, v) in o.iter_mut().zip(wide_out) {
                *y = v as $ty;
            }
            Ok(())
        }
    };
}

gpu_floor_div_widened_int!(gpu_floor_div_u8, u8, u32, floor_div_u32, FLOOR_DIV);
gpu_floor_div_widened_int!(gpu_floor_div_u16, u16, u32, floor_div_u32, FLOOR_DIV);
gpu_floor_div_widened_int!(gpu_floor_div_i16, i16, i32, floor_div_i32, FLOOR_DIV);

macro_rules! gpu_floor_div_half {
    ($fname:ident, $ty:ty) => {
        fn $fname(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
            let a: Vec<f32> = lhs.as_slice::<$ty>()?.iter().map(|v| v.to_f32()).collect();
            let b: Vec<f32> = rhs.as_slice::<$ty>()?.iter().map(|v| v.to_f32()).collect();
            let o = out.as_mut_slice::<$ty>()?;
            let mut wide_out = vec![0.0f32; o.len()];
            let state = gpu()?;
            log::debug!(
                "gpu launch {} [{}], {} elements (via f32)",
                FLOOR_DIV_REAL,
                <$ty as crate::dtype::Scalar>::ELEM,
                o.len()
            );
            pollster::block_on(run_floor_div_shader(
                state,
                &state.floor_div_f32,
                &a,
                &b,
                &mut wide_out,
            ))?;
            for (y, v) in o.iter_mut().zip(wide_out) {
                *y = <$ty>::from_f32(v);
            }
            Ok(())
        }
    };
}

gpu_floor_div_half!(gpu_floor_div_f16, half::f16);
gpu_floor_div_half!(gpu_floor_div_bf16, half::bf16);

/// Installs the GPU kernels into the registry. I64 and F64 are deliberately
/// absent; dispatching them on the GPU backend fails with
/// `UnsupportedCombination`.
pub fn register(reg: &mut KernelRegistry) -> Result<()> {
    reg.register(FLOOR_DIV, ElementType::I32, Backend::Gpu, gpu_floor_div_i32)?;
    reg.register(FLOOR_DIV, ElementType::U8, Backend::Gpu, gpu_floor_div_u8)?;
    reg.register(FLOOR_DIV, ElementType::U16, Backend::Gpu, gpu_floor_div_u16)?;
    reg.register(FLOOR_DIV, ElementType::I16, Backend::Gpu, gpu_floor_div_i16)?;
    reg.register(
        FLOOR_DIV_REAL,
        ElementType::F16,
        Backend::Gpu,
        gpu_floor_div_f16,
    )?;
    reg.register(
        FLOOR_DIV_REAL,
        ElementType::F32,
        Backend::Gpu,
        gpu_floor_div_f32,
    )?;
    reg.register(
        FLOOR_DIV_REAL,
        ElementType::BF16,
        Backend::Gpu,
        gpu_floor_div_bf16,
    )?;
    Ok(())
}
