use crate::{
    bus::Bus,
    cpu::flags::{
        FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
        FLAG_UNUSED, FLAG_ZERO,
    },
    log,
};

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: usize,
    pub bus: B,
    pub halted: bool,
    /// Print one nestest-style line per instruction.
    pub trace: bool,
}

impl<B: Bus> CPU<B> {
    /// Power-on registers; call [`CPU::reset`] to load PC from $FFFC.
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: FLAG_INTERRUPT_DISABLE | FLAG_UNUSED,
            cycles: 0,
            bus,
            halted: false,
            trace: false,
        }
    }

    pub fn reset(&mut self) {
        let lo = self.bus.read(0xFFFC) as u16;
        let hi = self.bus.read(0xFFFD) as u16;

        self.pc = (hi << 8) | lo;

        self.sp = 0xFD; // reset pulls three phantom stack bytes
        self.status = FLAG_INTERRUPT_DISABLE | FLAG_UNUSED;

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.halted = false;

        self.cycles = 7;
    }

    pub fn step(&mut self) {
        if self.halted {
            return;
        }

        let prev_cycles = self.cycles;

        if self.bus.poll_nmi() {
            self.nmi();
        }

        let pc = self.pc;
        let opcode = self.fetch_byte();
        if self.trace {
            self.trace(pc, opcode);
        }
        self.execute_opcode(opcode);
        let cycle_diff = self.cycles - prev_cycles;
        self.bus.tick(cycle_diff);
    }

    fn jam(&mut self) {
        self.halted = true;
    }

    fn fetch_byte(&mut self) -> u8 {
        let byte = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte() as u16;
        let hi = self.fetch_byte() as u16;
        (hi << 8) | lo
    }

    fn trace(&self, pc: u16, opcode: u8) {
        log::trace(format!(
            "{:04X}  {:02X}        A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            pc, opcode, self.a, self.x, self.y, self.status, self.sp, self.cycles
        ));
    }

    fn execute_opcode(&mut self, opcode: u8) {
        match opcode {
            0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
                self.jam()
            }
            0xA9 => self.lda_immediate(),
            0xAD => self.lda_absolute(),
            0xBD => self.lda_absolute_x(),
            0xA2 => self.ldx_immediate(),
            0x8D => self.sta_absolute(),
            0x8E => self.stx_absolute(),
            0xAA => self.tax(),
            0x9A => self.txs(),
            0xE8 => self.inx(),
            0xCA => self.dex(),
            0xE0 => self.cpx_immediate(),
            0x2C => self.bit_absolute(),
            0x10 => self.bpl(),
            0xD0 => self.bne(),
            0xF0 => self.beq(),
            0x4C => self.jmp_absolute(),
            0x20 => self.jsr(),
            0x60 => self.rts(),
            0x40 => self.rti(),
            0x00 => self.brk(),
            0x78 => self.sei(),
            0xD8 => self.cld(),
            _ => {
                log::error(format!(
                    "unimplemented opcode ${:02X} at ${:04X}; CPU jammed",
                    opcode,
                    self.pc.wrapping_sub(1)
                ));
                self.jam();
            }
        }
    }

    fn load_a(&mut self, value: u8) {
        self.a = value;
        self.update_zero_and_negative_flags(self.a);
    }

    fn lda_immediate(&mut self) {
        let value = self.fetch_byte();
        self.load_a(value);
        self.cycles += 2;
    }

    fn lda_absolute(&mut self) {
        let addr = self.fetch_word();
        let value = self.bus.read(addr);
        self.load_a(value);
        self.cycles += 4;
    }

    fn lda_absolute_x(&mut self) {
        let base = self.fetch_word();
        let final_addr = base.wrapping_add(self.x as u16);
        let value = self.bus.read(final_addr);
        self.load_a(value);
        self.cycles += 4 + Self::page_penalty(base, final_addr);
    }

    fn ldx_immediate(&mut self) {
        self.x = self.fetch_byte();
        self.update_zero_and_negative_flags(self.x);
        self.cycles += 2;
    }

    fn sta_absolute(&mut self) {
        let addr = self.fetch_word();
        self.bus.write(addr, self.a);
        self.cycles += 4;
    }

    fn stx_absolute(&mut self) {
        let addr = self.fetch_word();
        self.bus.write(addr, self.x);
        self.cycles += 4;
    }

    fn tax(&mut self) {
        self.x = self.a;
        self.update_zero_and_negative_flags(self.x);
        self.cycles += 2;
    }

    fn txs(&mut self) {
        self.sp = self.x;
        self.cycles += 2;
    }

    fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        self.update_zero_and_negative_flags(self.x);
        self.cycles += 2;
    }

    fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        self.update_zero_and_negative_flags(self.x);
        self.cycles += 2;
    }

    fn compare(&mut self, register: u8, value: u8) {
        if register >= value {
            self.status |= FLAG_CARRY;
        } else {
            self.status &= !FLAG_CARRY;
        }
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn cpx_immediate(&mut self) {
        let value = self.fetch_byte();
        self.compare(self.x, value);
        self.cycles += 2;
    }

    fn bit_absolute(&mut self) {
        let addr = self.fetch_word();
        let value = self.bus.read(addr);

        if (self.a & value) == 0 {
            self.status |= FLAG_ZERO;
        } else {
            self.status &= !FLAG_ZERO;
        }

        // N and V come straight from bits 7 and 6 of memory.
        self.status = (self.status & !(FLAG_NEGATIVE | FLAG_OVERFLOW))
            | (value & (FLAG_NEGATIVE | FLAG_OVERFLOW));

        self.cycles += 4;
    }

    fn bpl(&mut self) {
        let negative_clear = (self.status & FLAG_NEGATIVE) == 0;
        self.branch(negative_clear);
    }

    fn bne(&mut self) {
        let zero_clear = (self.status & FLAG_ZERO) == 0;
        self.branch(zero_clear);
    }

    fn beq(&mut self) {
        let zero_set = (self.status & FLAG_ZERO) != 0;
        self.branch(zero_set);
    }

    fn jmp_absolute(&mut self) {
        self.pc = self.fetch_word();
        self.cycles += 3;
    }

    fn jsr(&mut self) {
        let addr = self.fetch_word();

        let return_addr = self.pc.wrapping_sub(1);
        self.push((return_addr >> 8) as u8);
        self.push(return_addr as u8);

        self.pc = addr;
        self.cycles += 6;
    }

    fn rts(&mut self) {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;

        self.pc = ((hi << 8) | lo).wrapping_add(1);
        self.cycles += 6;
    }

    fn rti(&mut self) {
        let status = self.pop();
        self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;

        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        self.pc = (hi << 8) | lo;

        self.cycles += 6;
    }

    fn brk(&mut self) {
        self.pc = self.pc.wrapping_add(1); // +1 because of padding byte
        self.interrupt(0xFFFE, FLAG_BREAK);
    }

    fn sei(&mut self) {
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.cycles += 2;
    }

    fn cld(&mut self) {
        self.status &= !FLAG_DECIMAL;
        self.cycles += 2;
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        if value == 0 {
            self.status |= FLAG_ZERO;
        } else {
            self.status &= !FLAG_ZERO;
        }

        if value & 0x80 != 0 {
            self.status |= FLAG_NEGATIVE;
        } else {
            self.status &= !FLAG_NEGATIVE;
        }
    }

    fn nmi(&mut self) {
        self.interrupt(0xFFFA, 0);
    }

    /// Push PC and P (with `break_flag`), set I, and jump through `vector`.
    fn interrupt(&mut self, vector: u16, break_flag: u8) {
        self.push((self.pc >> 8) as u8);
        self.push(self.pc as u8);

        let status = (self.status & !FLAG_BREAK) | break_flag | FLAG_UNUSED;
        self.push(status);

        self.status |= FLAG_INTERRUPT_DISABLE;

        let lo = self.bus.read(vector) as u16;
        let hi = self.bus.read(vector + 1) as u16;
        self.pc = (hi << 8) | lo;

        self.cycles += 7;
    }

    fn push(&mut self, value: u8) {
        let addr = 0x0100 | self.sp as u16;
        self.bus.write(addr, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let addr = 0x0100 | self.sp as u16;
        self.bus.read(addr)
    }

    fn page_penalty(base: u16, addr: u16) -> usize {
        usize::from((base & 0xFF00) != (addr & 0xFF00))
    }

    fn branch(&mut self, condition: bool) {
        let offset = self.fetch_byte() as i8;

        if condition {
            let old_pc = self.pc;
            self.pc = self.pc.wrapping_add(offset as u16);
            self.cycles += 1 + Self::page_penalty(old_pc, self.pc);
        }

        self.cycles += 2;
    }
}
