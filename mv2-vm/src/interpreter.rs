//! Script interpreter walking a command buffer against the hardware layer.

use mv2_asm::{Command, Opcode, Status, Word};

use crate::error::ScriptError;
use crate::hal::{Hal, HalError, Mode, Options};

/// Script interpreter for one instrument.
///
/// Owns the hardware handle and a result buffer of fixed capacity that is
/// reused across runs; no allocation happens while a script executes. The
/// interpreter is stateless between runs apart from the mode register, which
/// lives in the hardware layer.
#[derive(Debug)]
pub struct Interpreter<H> {
    hal: H,
    output: Vec<Word>,
    capacity: usize,
}

impl<H> Interpreter<H> {
    /// Construct an interpreter over a hardware handle with the given result
    /// capacity, in words.
    pub fn new(hal: H, result_capacity: usize) -> Self {
        Self {
            hal,
            output: Vec::with_capacity(result_capacity),
            capacity: result_capacity,
        }
    }

    /// Shared access to the hardware handle.
    pub const fn hal(&self) -> &H {
        &self.hal
    }

    /// Exclusive access to the hardware handle.
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Release the hardware handle.
    pub fn into_hal(self) -> H {
        self.hal
    }
}

impl<H> Interpreter<H>
where
    H: Hal,
{
    /// Execute a command buffer to completion and expose the emitted result
    /// words.
    ///
    /// The result buffer is cleared on entry; nothing is emitted to the link
    /// from here. Emission order is buffer order with loop iterations
    /// expanded in sequence.
    pub fn run(&mut self, commands: &[Command]) -> Result<&[Word], ScriptError> {
        self.output.clear();
        self.exec_slice(commands, 0)?;
        Ok(&self.output)
    }

    /// Execute a buffer slice. `base` is the slice's offset in the full
    /// buffer so faults report absolute command indices.
    fn exec_slice(&mut self, commands: &[Command], base: usize) -> Result<(), ScriptError> {
        let mut i = 0;
        while i < commands.len() {
            let cmd = commands[i];
            let index = base + i;
            let op = self.check(cmd, index)?;

            if let Opcode::LoopBegin = op {
                let body = i + 1;
                let end = find_loop_end(commands, body)
                    .map_err(|status| ScriptError::at(status, index))?;
                for _ in 0..cmd.value() {
                    self.exec_slice(&commands[body..end], base + body)
                        .map_err(|e| e.relocate(index))?;
                }
                i = end;
            } else {
                self.step(op, cmd, index)?;
            }
            i += 1;
        }
        Ok(())
    }

    /// Decode the opcode and enforce mode safety.
    fn check(&self, cmd: Command, index: usize) -> Result<Opcode, ScriptError> {
        let op = cmd
            .opcode()
            .map_err(|_| ScriptError::at(Status::Syntax, index))?;
        if !self.hal.mode().allows(op.category()) {
            return Err(ScriptError::at(Status::Mode, index));
        }
        Ok(op)
    }

    /// Dispatch one non-loop command to the hardware layer.
    fn step(&mut self, op: Opcode, cmd: Command, index: usize) -> Result<(), ScriptError> {
        tracing::trace!(%cmd, index, "execute");

        match op {
            Opcode::ReadRegister0 | Opcode::ReadRegister1 | Opcode::ReadRegister2 => {
                let value = Word::from(self.hal.read_register(cmd.opcode_byte()));
                self.emit(value, index)?;
            }

            Opcode::WriteRegister0 | Opcode::WriteRegister1 | Opcode::WriteRegister2 => {
                let value = self.hal.write_read(Word::from(cmd));
                self.emit(value, index)?;
            }

            Opcode::SetInitBit => self.hal.set_init_bit(cmd.value() != 0),

            Opcode::WaitDataReady => self.hal.wait_data_ready().map_err(|e| match e {
                HalError::AdcTimeout => ScriptError::subsystem(Status::AdcTimeout),
            })?,

            Opcode::DigitizeBx => {
                let value = self.hal.digitize_bx();
                self.emit(value, index)?;
            }

            Opcode::DigitizeBy => {
                let value = self.hal.digitize_by();
                self.emit(value, index)?;
            }

            Opcode::DigitizeBz => {
                let value = self.hal.digitize_bz();
                self.emit(value, index)?;
            }

            Opcode::DigitizeTemp => {
                let value = self.hal.digitize_temp();
                self.emit(value, index)?;
            }

            Opcode::SetOptions => self
                .hal
                .set_options(Options::from_bits_truncate(cmd.value())),

            Opcode::SetMode => self.hal.set_mode(Mode::from_value(cmd.value())),

            // Handled by `exec_slice`; a stray `loop-end` at the top level
            // terminates nothing and does nothing.
            Opcode::LoopBegin | Opcode::LoopEnd => {}

            Opcode::GetFwVersion => {
                let value = self.hal.fw_version();
                self.emit(value, index)?;
            }
        }
        Ok(())
    }

    /// Append a result word, enforcing the fixed capacity.
    fn emit(&mut self, value: Word, index: usize) -> Result<(), ScriptError> {
        if self.output.len() >= self.capacity {
            return Err(ScriptError::at(Status::OutOfMemory, index));
        }
        self.output.push(value);
        Ok(())
    }
}

impl ScriptError {
    /// Re-point a loop-body fault at the enclosing `loop-begin`.
    ///
    /// Subsystem faults keep their own detail word.
    fn relocate(self, outer: usize) -> Self {
        match self.status {
            Status::AdcTimeout => self,
            status => ScriptError::at(status, outer),
        }
    }
}

/// Scan for the `loop-end` matching a `loop-begin` whose body starts at
/// `from`.
///
/// A second `loop-begin` before the end is a nesting violation; a buffer
/// ending without the marker leaves the loop unspecified. Undecodable words
/// encountered during the scan surface as syntax faults here, before any
/// iteration runs.
fn find_loop_end(commands: &[Command], from: usize) -> Result<usize, Status> {
    for (i, cmd) in commands.iter().enumerate().skip(from) {
        match cmd.opcode() {
            Err(_) => return Err(Status::Syntax),
            Ok(Opcode::LoopEnd) => return Ok(i),
            Ok(Opcode::LoopBegin) => return Err(Status::NestedLoop),
            Ok(_) => {}
        }
    }
    Err(Status::UnspecifiedLoop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FW_VERSION, RESULT_CAPACITY_SMALL};
    use crate::sim::SimHal;
    use mv2_asm::Status;

    fn analog_interpreter() -> Interpreter<SimHal> {
        let mut hal = SimHal::new();
        hal.set_mode(Mode::Analog);
        Interpreter::new(hal, RESULT_CAPACITY_SMALL)
    }

    #[test]
    fn single_digitize_emits_one_word() {
        let mut vm = analog_interpreter();
        vm.hal_mut().queue_bx([0x3210]);
        let results = vm.run(&[Command::new(Opcode::DigitizeBx, 0)]).unwrap();
        assert_eq!(&[0x3210], results);
    }

    #[test]
    fn loop_expands_in_buffer_order() {
        let mut vm = analog_interpreter();
        vm.hal_mut().queue_bx([100, 101]);
        vm.hal_mut().queue_by([200, 201]);
        let script = [
            Command::new(Opcode::LoopBegin, 2),
            Command::new(Opcode::DigitizeBx, 0),
            Command::new(Opcode::DigitizeBy, 0),
            Command::new(Opcode::LoopEnd, 0),
        ];
        let results = vm.run(&script).unwrap();
        assert_eq!(&[100, 200, 101, 201], results);
    }

    #[test]
    fn emission_count_matches_loop_multiplier() {
        let mut vm = analog_interpreter();
        let script = [
            Command::new(Opcode::DigitizeTemp, 0),
            Command::new(Opcode::LoopBegin, 5),
            Command::new(Opcode::DigitizeBx, 0),
            Command::new(Opcode::LoopEnd, 0),
            Command::new(Opcode::GetFwVersion, 0),
        ];
        let results = vm.run(&script).unwrap();
        assert_eq!(1 + 5 + 1, results.len());
        assert_eq!(FW_VERSION, results[6]);
    }

    #[test]
    fn analog_opcode_in_digital_mode_faults() {
        let mut vm = Interpreter::new(SimHal::new(), RESULT_CAPACITY_SMALL);
        let script = [
            Command::new(Opcode::SetInitBit, 1),
            Command::new(Opcode::DigitizeBx, 0),
        ];
        let err = vm.run(&script).unwrap_err();
        assert_eq!(ScriptError::at(Status::Mode, 1), err);
    }

    #[test]
    fn digital_opcode_in_analog_mode_faults() {
        let mut vm = analog_interpreter();
        let err = vm.run(&[Command::new(Opcode::ReadRegister0, 0)]).unwrap_err();
        assert_eq!(ScriptError::at(Status::Mode, 0), err);
    }

    #[test]
    fn set_mode_takes_effect_before_next_command() {
        let mut vm = Interpreter::new(SimHal::new(), RESULT_CAPACITY_SMALL);
        vm.hal_mut().queue_bx([7]);
        let script = [
            Command::new(Opcode::ReadRegister0, 0),
            Command::new(Opcode::SetMode, 1),
            Command::new(Opcode::DigitizeBx, 0),
        ];
        let results = vm.run(&script).unwrap();
        assert_eq!(2, results.len());
        assert_eq!(7, results[1]);
    }

    #[test]
    fn nested_loop_reports_outer_begin() {
        let mut vm = analog_interpreter();
        let script = [
            Command::new(Opcode::DigitizeBx, 0),
            Command::new(Opcode::LoopBegin, 2),
            Command::new(Opcode::LoopBegin, 2),
            Command::new(Opcode::LoopEnd, 0),
            Command::new(Opcode::LoopEnd, 0),
        ];
        let err = vm.run(&script).unwrap_err();
        assert_eq!(ScriptError::at(Status::NestedLoop, 1), err);
    }

    #[test]
    fn unterminated_loop_faults() {
        let mut vm = analog_interpreter();
        let script = [
            Command::new(Opcode::LoopBegin, 2),
            Command::new(Opcode::DigitizeBx, 0),
        ];
        let err = vm.run(&script).unwrap_err();
        assert_eq!(ScriptError::at(Status::UnspecifiedLoop, 0), err);
    }

    #[test]
    fn unknown_opcode_faults_at_index() {
        let mut vm = analog_interpreter();
        let script = [
            Command::new(Opcode::DigitizeBx, 0),
            Command::pack(0x99, 0),
        ];
        let err = vm.run(&script).unwrap_err();
        assert_eq!(ScriptError::at(Status::Syntax, 1), err);
    }

    #[test]
    fn mode_fault_inside_loop_reports_outer_begin() {
        let mut vm = analog_interpreter();
        let script = [
            Command::new(Opcode::LoopBegin, 2),
            Command::new(Opcode::ReadRegister0, 0),
            Command::new(Opcode::LoopEnd, 0),
        ];
        let err = vm.run(&script).unwrap_err();
        assert_eq!(ScriptError::at(Status::Mode, 0), err);
    }

    #[test]
    fn output_overflow_is_out_of_memory() {
        let mut hal = SimHal::new();
        hal.set_mode(Mode::Analog);
        let mut vm = Interpreter::new(hal, 2);
        let script = [
            Command::new(Opcode::LoopBegin, 3),
            Command::new(Opcode::DigitizeBx, 0),
            Command::new(Opcode::LoopEnd, 0),
        ];
        let err = vm.run(&script).unwrap_err();
        assert_eq!(Status::OutOfMemory, err.status);
        // relocated to the enclosing loop-begin
        assert_eq!(0, err.detail);
    }

    #[test]
    fn adc_timeout_keeps_subsystem_detail() {
        let mut vm = Interpreter::new(SimHal::new(), RESULT_CAPACITY_SMALL);
        vm.hal_mut().set_data_ready(false);
        let script = [
            Command::new(Opcode::LoopBegin, 2),
            Command::new(Opcode::WaitDataReady, 0),
            Command::new(Opcode::LoopEnd, 0),
        ];
        let err = vm.run(&script).unwrap_err();
        assert_eq!(ScriptError::subsystem(Status::AdcTimeout), err);
    }

    #[test]
    fn empty_loop_emits_nothing() {
        let mut vm = analog_interpreter();
        let script = [
            Command::new(Opcode::LoopBegin, 4),
            Command::new(Opcode::LoopEnd, 0),
        ];
        assert!(vm.run(&script).unwrap().is_empty());
    }

    #[test]
    fn buffer_is_cleared_between_runs() {
        let mut vm = analog_interpreter();
        let script = [Command::new(Opcode::DigitizeTemp, 0)];
        assert_eq!(1, vm.run(&script).unwrap().len());
        assert_eq!(1, vm.run(&script).unwrap().len());
    }
}
