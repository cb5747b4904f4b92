//! A two-pass 6502 assembler with named labels.
//!
//! Only the addressing modes the boot code uses: implied, immediate, absolute,
//! absolute indexed and relative. Forward references are patched in [`Assembler::finish`].

use std::collections::HashMap;

use anyhow::{anyhow, bail};

pub mod op {
    pub const SEI: u8 = 0x78;
    pub const CLD: u8 = 0xD8;
    pub const TXS: u8 = 0x9A;
    pub const INX: u8 = 0xE8;
    pub const RTI: u8 = 0x40;
    pub const LDA_IMM: u8 = 0xA9;
    pub const LDA_ABS: u8 = 0xAD;
    pub const LDA_ABS_X: u8 = 0xBD;
    pub const LDX_IMM: u8 = 0xA2;
    pub const STA_ABS: u8 = 0x8D;
    pub const STX_ABS: u8 = 0x8E;
    pub const CPX_IMM: u8 = 0xE0;
    pub const BIT_ABS: u8 = 0x2C;
    pub const BPL: u8 = 0x10;
    pub const BNE: u8 = 0xD0;
    pub const BEQ: u8 = 0xF0;
    pub const JMP_ABS: u8 = 0x4C;
}

enum Patch {
    /// Little-endian address of the label.
    Absolute,
    /// Signed 8-bit offset from the byte after the operand.
    Relative,
}

struct Fixup {
    offset: usize,
    label: &'static str,
    patch: Patch,
}

pub struct Assembler {
    origin: u16,
    code: Vec<u8>,
    labels: HashMap<&'static str, u16>,
    fixups: Vec<Fixup>,
    duplicate: Option<&'static str>,
}

impl Assembler {
    /// Start assembling at CPU address `origin`.
    pub fn new(origin: u16) -> Self {
        Self {
            origin,
            code: Vec::new(),
            labels: HashMap::new(),
            fixups: Vec::new(),
            duplicate: None,
        }
    }

    /// Address the next byte will land at.
    pub fn pc(&self) -> u16 {
        self.origin.wrapping_add(self.code.len() as u16)
    }

    pub fn label(&mut self, name: &'static str) -> &mut Self {
        let pc = self.pc();
        if self.labels.insert(name, pc).is_some() {
            self.duplicate.get_or_insert(name);
        }
        self
    }

    pub fn implied(&mut self, opcode: u8) -> &mut Self {
        self.code.push(opcode);
        self
    }

    pub fn immediate(&mut self, opcode: u8, value: u8) -> &mut Self {
        self.code.extend_from_slice(&[opcode, value]);
        self
    }

    pub fn absolute(&mut self, opcode: u8, addr: u16) -> &mut Self {
        self.code.push(opcode);
        self.code.extend_from_slice(&addr.to_le_bytes());
        self
    }

    /// Absolute (or absolute indexed) operand naming a label.
    pub fn absolute_label(&mut self, opcode: u8, label: &'static str) -> &mut Self {
        self.code.push(opcode);
        self.fixups.push(Fixup {
            offset: self.code.len(),
            label,
            patch: Patch::Absolute,
        });
        self.code.extend_from_slice(&[0, 0]);
        self
    }

    pub fn branch(&mut self, opcode: u8, label: &'static str) -> &mut Self {
        self.code.push(opcode);
        self.fixups.push(Fixup {
            offset: self.code.len(),
            label,
            patch: Patch::Relative,
        });
        self.code.push(0);
        self
    }

    /// Raw data bytes.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.code.extend_from_slice(data);
        self
    }

    pub fn address_of(&self, label: &str) -> Option<u16> {
        self.labels.get(label).copied()
    }

    /// Resolve every label reference and return the machine code.
    pub fn finish(mut self) -> anyhow::Result<Vec<u8>> {
        if let Some(name) = self.duplicate {
            bail!("label `{name}` defined twice");
        }

        for fixup in &self.fixups {
            let target = *self
                .labels
                .get(fixup.label)
                .ok_or_else(|| anyhow!("undefined label `{}`", fixup.label))?;

            match fixup.patch {
                Patch::Absolute => {
                    self.code[fixup.offset..fixup.offset + 2].copy_from_slice(&target.to_le_bytes());
                }
                Patch::Relative => {
                    let next = self.origin as i32 + fixup.offset as i32 + 1;
                    let delta = target as i32 - next;
                    let Ok(delta) = i8::try_from(delta) else {
                        bail!("branch to `{}` out of range ({delta} bytes)", fixup.label);
                    };
                    self.code[fixup.offset] = delta as u8;
                }
            }
        }

        Ok(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_branch_and_forward_jump() {
        let mut asm = Assembler::new(0xC000);
        asm.label("wait")
            .absolute(op::BIT_ABS, 0x2002)
            .branch(op::BPL, "wait")
            .absolute_label(op::JMP_ABS, "end")
            .label("end")
            .implied(op::RTI);

        let code = asm.finish().unwrap();
        assert_eq!(
            code,
            vec![0x2C, 0x02, 0x20, 0x10, 0xFB, 0x4C, 0x08, 0xC0, 0x40]
        );
    }

    #[test]
    fn undefined_label_is_an_error() {
        let mut asm = Assembler::new(0xC000);
        asm.branch(op::BNE, "nowhere");
        let err = asm.finish().unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let mut asm = Assembler::new(0xC000);
        asm.label("a").implied(op::INX).label("a");
        assert!(asm.finish().is_err());
    }

    #[test]
    fn branch_out_of_range_is_an_error() {
        let mut asm = Assembler::new(0xC000);
        asm.branch(op::BEQ, "far").bytes(&[0; 200]).label("far");
        let err = asm.finish().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn pc_tracks_emitted_bytes() {
        let mut asm = Assembler::new(0x8000);
        asm.immediate(op::LDA_IMM, 1).absolute(op::STA_ABS, 0x0200);
        assert_eq!(asm.pc(), 0x8005);
        asm.label("here");
        assert_eq!(asm.address_of("here"), Some(0x8005));
    }
}
