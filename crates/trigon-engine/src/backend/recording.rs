//! Headless backend that records every call.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::coords::{ClearColor, ViewportState};
use crate::mesh::AttributeDescriptor;
use crate::shader::ShaderStage;

use super::{GpuBackend, SurfaceErrorAction};

/// One recorded backend call. Handles are the integer ids the backend issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader { shader: u32, stage: ShaderStage, entry_point: String },
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    CreateBuffer { buffer: u32, bytes: usize },
    DeleteBuffer(u32),
    CreateVertexArray(u32),
    BindVertexBuffer { array: u32, buffer: u32, stride: u32 },
    DescribeAttribute { array: u32, attribute: AttributeDescriptor },
    DeleteVertexArray(u32),
    SetViewport(ViewportState),
    BeginFrame { clear: ClearColor },
    DrawArrays {
        program: u32,
        array: u32,
        vertex_count: u32,
        /// Viewport in effect when the draw was issued.
        viewport: ViewportState,
    },
    Present,
}

impl Call {
    /// True for calls that allocate a GPU object.
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Call::CreateShader { .. }
                | Call::CreateProgram(_)
                | Call::CreateBuffer { .. }
                | Call::CreateVertexArray(_)
        )
    }

    /// True for calls that release a GPU object.
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            Call::DeleteShader(_) | Call::DeleteProgram(_) | Call::DeleteBuffer(_) | Call::DeleteVertexArray(_)
        )
    }
}

/// Frame token; consumed by `present`.
#[derive(Debug)]
pub struct RecordedFrame {
    _private: (),
}

/// [`GpuBackend`] that performs no GPU work.
///
/// Every call is appended to a log that tests can inspect. Link failures and
/// frame-acquisition outcomes can be scripted.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: Cell<u32>,
    calls: RefCell<Vec<Call>>,
    viewport: Cell<ViewportState>,
    link_failure: RefCell<Option<String>>,
    frame_outcomes: RefCell<VecDeque<SurfaceErrorAction>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Objects created and not yet deleted.
    pub fn live_objects(&self) -> usize {
        let calls = self.calls.borrow();
        let created = calls.iter().filter(|c| c.is_create()).count();
        let deleted = calls.iter().filter(|c| c.is_delete()).count();
        created.saturating_sub(deleted)
    }

    /// Makes the next `link_program` fail with `log`.
    pub fn fail_next_link(&self, log: impl Into<String>) {
        *self.link_failure.borrow_mut() = Some(log.into());
    }

    /// Makes the next `begin_frame` fail with `action`. Outcomes queue up.
    pub fn fail_next_frame(&self, action: SurfaceErrorAction) {
        self.frame_outcomes.borrow_mut().push_back(action);
    }

    fn issue(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn record(&self, call: Call) {
        log::trace!("RecordingBackend: {call:?}");
        self.calls.borrow_mut().push(call);
    }
}

impl GpuBackend for RecordingBackend {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type Frame = RecordedFrame;

    fn create_shader(&self, stage: ShaderStage, _source: &str, entry_point: &str) -> u32 {
        let shader = self.issue();
        self.record(Call::CreateShader { shader, stage, entry_point: entry_point.to_owned() });
        shader
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> u32 {
        let program = self.issue();
        self.record(Call::CreateProgram(program));
        program
    }

    fn attach_shader(&self, program: &mut u32, shader: &u32) {
        self.record(Call::AttachShader { program: *program, shader: *shader });
    }

    fn link_program(&self, program: &mut u32) -> Result<(), String> {
        self.record(Call::LinkProgram(*program));
        match self.link_failure.borrow_mut().take() {
            Some(log) => Err(log),
            None => Ok(()),
        }
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
    }

    fn create_buffer(&self, contents: &[u8]) -> u32 {
        let buffer = self.issue();
        self.record(Call::CreateBuffer { buffer, bytes: contents.len() });
        buffer
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> u32 {
        let array = self.issue();
        self.record(Call::CreateVertexArray(array));
        array
    }

    fn bind_vertex_buffer(&self, array: &mut u32, buffer: &u32, stride: u32) {
        self.record(Call::BindVertexBuffer { array: *array, buffer: *buffer, stride });
    }

    fn describe_attribute(&self, array: &mut u32, attribute: &AttributeDescriptor) {
        self.record(Call::DescribeAttribute { array: *array, attribute: *attribute });
    }

    fn delete_vertex_array(&self, array: u32) {
        self.record(Call::DeleteVertexArray(array));
    }

    fn set_viewport(&self, viewport: ViewportState) {
        self.viewport.set(viewport);
        self.record(Call::SetViewport(viewport));
    }

    fn begin_frame(&self, clear: ClearColor) -> Result<RecordedFrame, SurfaceErrorAction> {
        if let Some(action) = self.frame_outcomes.borrow_mut().pop_front() {
            return Err(action);
        }
        self.record(Call::BeginFrame { clear });
        Ok(RecordedFrame { _private: () })
    }

    fn draw_arrays(&self, _frame: &mut RecordedFrame, program: &u32, array: &u32, vertex_count: u32) {
        self.record(Call::DrawArrays {
            program: *program,
            array: *array,
            vertex_count,
            viewport: self.viewport.get(),
        });
    }

    fn present(&self, _frame: RecordedFrame) {
        self.record(Call::Present);
    }
}
