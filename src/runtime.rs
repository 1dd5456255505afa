use crate::bits::{bit, effective_address, reg_field, sign_extend};
use crate::console::{Console, StdConsole};
use crate::error::MachineError;
use crate::loader::Image;
use crate::memory::Memory;
use crate::ops::Opcode;
use crate::output;
use crate::registers::{Register, Registers};

type Result<T> = std::result::Result<T, MachineError>;

/// Behaviour switches which are not part of machine state.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    /// Treat reserved opcodes (`RTI`, `RES`) as fatal instead of skipping them.
    pub strict: bool,
    /// Report every instruction before it executes.
    pub trace: bool,
}

/// Represents complete program state during runtime.
///
/// Owns memory, registers and the console, so several machines can coexist.
pub struct Machine<C: Console = StdConsole> {
    mem: Memory,
    reg: Registers,
    /// Cleared by `HALT`. Never set again.
    running: bool,
    console: C,
    opts: RunOptions,
    /// Instructions executed so far.
    steps: u64,
}

impl Machine<StdConsole> {
    /// Machine attached to the process' standard streams.
    pub fn stdio(opts: RunOptions) -> Self {
        Self::with_options(StdConsole::new(), opts)
    }
}

impl<C: Console> Machine<C> {
    pub fn new(console: C) -> Self {
        Self::with_options(console, RunOptions::default())
    }

    pub fn with_options(console: C, opts: RunOptions) -> Self {
        Machine {
            mem: Memory::new(),
            reg: Registers::new(),
            running: true,
            console,
            opts,
            steps: 0,
        }
    }

    /// Load an image into memory. Does not move the PC.
    ///
    /// Returns the amount of words written.
    pub fn load(&mut self, image: &Image) -> usize {
        image.load_into(&mut self.mem)
    }

    const OP_TABLE: [fn(&mut Self, u16) -> Result<()>; 16] = [
        Self::br,       // 0x0
        Self::add,      // 0x1
        Self::ld,       // 0x2
        Self::st,       // 0x3
        Self::jsr,      // 0x4
        Self::and,      // 0x5
        Self::ldr,      // 0x6
        Self::str,      // 0x7
        Self::reserved, // 0x8 RTI
        Self::not,      // 0x9
        Self::ldi,      // 0xA
        Self::sti,      // 0xB
        Self::jmp,      // 0xC
        Self::reserved, // 0xD RES
        Self::lea,      // 0xE
        Self::trap,     // 0xF
    ];

    /// Run until `HALT`, or until a fatal error.
    pub fn run(&mut self) -> Result<()> {
        while self.running {
            self.step()?;
        }
        Ok(())
    }

    /// Fetch, decode and execute a single instruction. Does nothing once halted.
    pub fn step(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        let addr = self.reg.fetch_pc();
        let instr = self.mem.read(addr)?;
        let opcode = (instr >> 12) as usize;
        if self.opts.trace {
            output::trace(format_args!(
                "0x{addr:04x} {:<4} 0x{instr:04x}",
                Opcode::of(instr)
            ));
        }
        self.steps += 1;
        Self::OP_TABLE[opcode](self, instr)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn halt(&mut self) {
        self.running = false;
    }

    pub fn pc(&self) -> u16 {
        self.reg.pc()
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.reg.set_pc(pc);
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.reg
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn instruction_count(&self) -> u64 {
        self.steps
    }

    #[inline]
    fn reg(&self, field: u16) -> u16 {
        self.reg.get(Register::from_field(field))
    }

    /// Second operand of `ADD`/`AND`: register or 5-bit immediate.
    #[inline]
    fn operand2(&self, instr: u16) -> u16 {
        if bit(instr, 5) {
            sign_extend(instr, 5)
        } else {
            self.reg(instr)
        }
    }

    /// `PC + SEXT(offset9)`, with the PC already advanced past this instruction.
    #[inline]
    fn pc_offset9(&self, instr: u16) -> i32 {
        effective_address(self.reg.pc(), sign_extend(instr, 9))
    }

    /// `BaseR + SEXT(offset6)`.
    #[inline]
    fn base_offset6(&self, instr: u16) -> i32 {
        effective_address(self.reg(reg_field(instr, 6)), sign_extend(instr, 6))
    }

    fn add(&mut self, instr: u16) -> Result<()> {
        let dr = Register::from_field(reg_field(instr, 9));
        let res = self.reg(reg_field(instr, 6)).wrapping_add(self.operand2(instr));
        self.reg.set_with_flags(dr, res);
        Ok(())
    }

    fn and(&mut self, instr: u16) -> Result<()> {
        let dr = Register::from_field(reg_field(instr, 9));
        let res = self.reg(reg_field(instr, 6)) & self.operand2(instr);
        self.reg.set_with_flags(dr, res);
        Ok(())
    }

    fn not(&mut self, instr: u16) -> Result<()> {
        let dr = Register::from_field(reg_field(instr, 9));
        let res = !self.reg(reg_field(instr, 6));
        self.reg.set_with_flags(dr, res);
        Ok(())
    }

    fn br(&mut self, instr: u16) -> Result<()> {
        let mask = reg_field(instr, 9);
        if self.reg.cond().matches(mask) {
            let pc = self.reg.pc().wrapping_add(sign_extend(instr, 9));
            self.reg.set_pc(pc);
        }
        Ok(())
    }

    fn jmp(&mut self, instr: u16) -> Result<()> {
        let target = self.reg(reg_field(instr, 6));
        self.reg.set_pc(target);
        Ok(())
    }

    fn jsr(&mut self, instr: u16) -> Result<()> {
        let ret = self.reg.pc();
        // R7 is written first, so `JSRR R7` jumps to the instruction after itself
        self.reg.set(Register::R7, ret);
        let target = if bit(instr, 11) {
            ret.wrapping_add(sign_extend(instr, 11))
        } else {
            self.reg(reg_field(instr, 6))
        };
        self.reg.set_pc(target);
        Ok(())
    }

    fn ld(&mut self, instr: u16) -> Result<()> {
        let dr = Register::from_field(reg_field(instr, 9));
        let val = self.mem.read(self.pc_offset9(instr))?;
        self.reg.set_with_flags(dr, val);
        Ok(())
    }

    fn ldi(&mut self, instr: u16) -> Result<()> {
        let dr = Register::from_field(reg_field(instr, 9));
        let ptr = self.mem.read(self.pc_offset9(instr))?;
        let val = self.mem.read(ptr)?;
        self.reg.set_with_flags(dr, val);
        Ok(())
    }

    fn ldr(&mut self, instr: u16) -> Result<()> {
        let dr = Register::from_field(reg_field(instr, 9));
        let val = self.mem.read(self.base_offset6(instr))?;
        self.reg.set_with_flags(dr, val);
        Ok(())
    }

    fn lea(&mut self, instr: u16) -> Result<()> {
        let dr = Register::from_field(reg_field(instr, 9));
        let val = self.reg.pc().wrapping_add(sign_extend(instr, 9));
        self.reg.set_with_flags(dr, val);
        Ok(())
    }

    fn st(&mut self, instr: u16) -> Result<()> {
        let val = self.reg(reg_field(instr, 9));
        self.mem.write(self.pc_offset9(instr), val)
    }

    fn sti(&mut self, instr: u16) -> Result<()> {
        let val = self.reg(reg_field(instr, 9));
        let ptr = self.mem.read(self.pc_offset9(instr))?;
        self.mem.write(ptr, val)
    }

    fn str(&mut self, instr: u16) -> Result<()> {
        let val = self.reg(reg_field(instr, 9));
        self.mem.write(self.base_offset6(instr), val)
    }

    /// `RTI` and `RES`: skipped with a warning, or fatal in strict mode.
    fn reserved(&mut self, instr: u16) -> Result<()> {
        let address = self.reg.pc().wrapping_sub(1);
        let opcode = instr >> 12;
        if self.opts.strict {
            return Err(MachineError::ReservedOpcode { opcode, address });
        }
        output::warning(format_args!(
            "unknown opcode {} (0x{instr:04x}) at 0x{address:04x}, skipping",
            Opcode::of(instr)
        ));
        Ok(())
    }
}
