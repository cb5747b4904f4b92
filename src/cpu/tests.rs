use crate::{
    bus::Bus,
    cpu::{
        cpu::CPU,
        flags::{FLAG_CARRY, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW, FLAG_ZERO},
    },
};

struct TestBus {
    mem: [u8; 65536],
    ticked: usize,
}

impl TestBus {
    fn new() -> Self {
        Self {
            mem: [0; 65536],
            ticked: 0,
        }
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.mem[addr as usize] = data;
    }

    fn tick(&mut self, cycles: usize) {
        self.ticked += cycles;
    }
}

fn new_cpu(bus: TestBus) -> CPU<TestBus> {
    CPU::new(bus)
}

#[test]
fn lda_immediate_loads_value() {
    let mut bus = TestBus::new();
    bus.mem[0x8000] = 0xA9; // LDA #$42
    bus.mem[0x8001] = 0x42;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);

    cpu.reset();
    cpu.step();

    assert_eq!(cpu.a, 0x42)
}

#[test]
fn lda_sets_zero_flag() {
    let mut bus = TestBus::new();
    bus.mem[0x8000] = 0xA9; // LDA #$00
    bus.mem[0x8001] = 0x00;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);

    cpu.reset();
    cpu.step();
    assert!(cpu.status & FLAG_ZERO != 0)
}

#[test]
fn lda_sets_negative_flag() {
    let mut bus = TestBus::new();
    bus.mem[0x8000] = 0xA9; // LDA #$80
    bus.mem[0x8001] = 0x80;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);

    cpu.reset();
    cpu.step(); // LDA

    assert!(cpu.status & FLAG_NEGATIVE != 0)
}

#[test]
fn tax_transfers_a_to_x() {
    let mut bus = TestBus::new();
    bus.mem[0x8000] = 0xA9; // LDA #$10
    bus.mem[0x8001] = 0x10;

    bus.mem[0x8002] = 0xAA; // TAX

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();

    cpu.step(); // LDA
    cpu.step(); // TAX

    assert_eq!(cpu.x, 0x10)
}

#[test]
fn sta_writes_to_memory() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0xA9; // LDA #$33
    bus.mem[0x8001] = 0x33;

    bus.mem[0x8002] = 0x8D; // STA $0200
    bus.mem[0x8003] = 0x00;
    bus.mem[0x8004] = 0x02;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();

    cpu.step(); // LDA
    cpu.step(); // STA

    assert_eq!(cpu.bus.mem[0x0200], 0x33);
}

#[test]
fn jmp_changes_program_counter() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0x4C; // JMP $9000
    bus.mem[0x8001] = 0x00;
    bus.mem[0x8002] = 0x90;

    bus.mem[0x9000] = 0xA9; // LDA #$55
    bus.mem[0x9001] = 0x55;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();

    cpu.step(); // JMP
    cpu.step(); // LDA

    assert_eq!(cpu.a, 0x55);
}

#[test]
fn inx_increments_x() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0xA2; // LDX #$01
    bus.mem[0x8001] = 0x01;
    bus.mem[0x8002] = 0xE8; // INX

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();

    cpu.step(); // LDX
    cpu.step(); // INX

    assert_eq!(cpu.x, 0x02);
}

#[test]
fn dex_sets_zero_flag() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0xA2; // LDX #$01
    bus.mem[0x8001] = 0x01;
    bus.mem[0x8002] = 0xCA; // DEX

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();

    cpu.step(); // LDX
    cpu.step(); // DEX

    assert!(cpu.status & FLAG_ZERO != 0);
}

#[test]
fn bne_loops_until_zero() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0xA2; // LDX #3
    bus.mem[0x8001] = 0x03;
    bus.mem[0x8002] = 0xCA; // DEX
    bus.mem[0x8003] = 0xD0; // BNE -3
    bus.mem[0x8004] = 0xFD; // -3 offset

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();

    for _ in 0..6 {
        cpu.step();
    }

    assert_eq!(cpu.x, 0x00);
}

#[test]
fn jsr_and_rts_work() {
    let mut bus = TestBus::new();

    // main program
    bus.mem[0x8000] = 0x20; // JSR $9000
    bus.mem[0x8001] = 0x00;
    bus.mem[0x8002] = 0x90;
    bus.mem[0x8003] = 0xA9; // LDA #$11
    bus.mem[0x8004] = 0x11;

    // subroutine
    bus.mem[0x9000] = 0xA9; // LDA #$22
    bus.mem[0x9001] = 0x22;
    bus.mem[0x9002] = 0x60; // RTS

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();

    cpu.step(); // JSR
    cpu.step(); // LDA #$22
    cpu.step(); // RTS
    cpu.step(); // LDA #$11

    assert_eq!(cpu.a, 0x11);
}

#[test]
fn brk_jumps_to_irq_vector() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0x00; // BRK

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0x90;

    let mut cpu = new_cpu(bus);
    cpu.reset();
    cpu.step();

    assert_eq!(cpu.pc, 0x9000);
}

#[test]
fn bit_copies_bits_7_and_6_from_memory() {
    let mut bus = TestBus::new();

    bus.mem[0x2002] = 0xC0;
    bus.mem[0x8000] = 0x2C; // BIT $2002
    bus.mem[0x8001] = 0x02;
    bus.mem[0x8002] = 0x20;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();
    cpu.step();

    assert!(cpu.status & FLAG_NEGATIVE != 0);
    assert!(cpu.status & FLAG_OVERFLOW != 0);
    assert!(cpu.status & FLAG_ZERO != 0); // A = 0
}

#[test]
fn lda_absolute_x_walks_a_zero_terminated_table() {
    let mut bus = TestBus::new();

    bus.mem[0x9000..0x9003].copy_from_slice(b"Hi\0");

    bus.mem[0x8000] = 0xA2; // LDX #0
    bus.mem[0x8001] = 0x00;
    bus.mem[0x8002] = 0xBD; // loop: LDA $9000,X
    bus.mem[0x8003] = 0x00;
    bus.mem[0x8004] = 0x90;
    bus.mem[0x8005] = 0xF0; // BEQ done
    bus.mem[0x8006] = 0x07;
    bus.mem[0x8007] = 0x9D; // STA $0200,X
    bus.mem[0x8008] = 0x00;
    bus.mem[0x8009] = 0x02;
    bus.mem[0x800A] = 0xE8; // INX
    bus.mem[0x800B] = 0x4C; // JMP loop
    bus.mem[0x800C] = 0x02;
    bus.mem[0x800D] = 0x80;
    bus.mem[0x800E] = 0x02; // done: jam

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();
    while !cpu.halted {
        cpu.step();
    }

    assert_eq!(&cpu.bus.mem[0x0200..0x0203], b"Hi\0");
    assert_eq!(cpu.x, 2);
    assert_eq!(cpu.pc, 0x800F);
}

#[test]
fn cpx_sets_carry_and_zero_on_equal() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0xA2; // LDX #$10
    bus.mem[0x8001] = 0x10;
    bus.mem[0x8002] = 0xE0; // CPX #$10
    bus.mem[0x8003] = 0x10;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();
    cpu.step();
    cpu.step();

    assert!(cpu.status & FLAG_CARRY != 0);
    assert!(cpu.status & FLAG_ZERO != 0);
}

#[test]
fn rti_returns_from_brk() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0x00; // BRK
    bus.mem[0x8001] = 0xEA; // padding
    bus.mem[0x8002] = 0xA9; // LDA #$07
    bus.mem[0x8003] = 0x07;
    bus.mem[0x9000] = 0x40; // RTI

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0x90;

    let mut cpu = new_cpu(bus);
    cpu.reset();
    cpu.step(); // BRK
    assert!(cpu.status & FLAG_INTERRUPT_DISABLE != 0);
    cpu.step(); // RTI
    cpu.step(); // LDA

    assert_eq!(cpu.a, 0x07);
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn unknown_opcode_jams_the_cpu() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0x69; // ADC #imm: not implemented
    bus.mem[0x8001] = 0x01;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();
    cpu.step();
    cpu.step();

    assert!(cpu.halted);
    assert_eq!(cpu.pc, 0x8001);
}

#[test]
fn step_ticks_the_bus_by_instruction_cycles() {
    let mut bus = TestBus::new();

    bus.mem[0x8000] = 0x8D; // STA $0200
    bus.mem[0x8001] = 0x00;
    bus.mem[0x8002] = 0x02;
    bus.mem[0x8003] = 0x4C; // JMP $8003
    bus.mem[0x8004] = 0x03;
    bus.mem[0x8005] = 0x80;

    bus.mem[0xFFFC] = 0x00;
    bus.mem[0xFFFD] = 0x80;

    let mut cpu = new_cpu(bus);
    cpu.reset();
    cpu.step();
    cpu.step();

    assert_eq!(cpu.bus.ticked, 4 + 3);
}

#[test]
fn opcodes_outside_the_boot_subset_jam() {
    // PHA, SEC, NOP, LDY #imm
    for opcode in [0x48, 0x38, 0xEA, 0xA0] {
        let mut bus = TestBus::new();
        bus.mem[0x8000] = opcode;
        bus.mem[0xFFFC] = 0x00;
        bus.mem[0xFFFD] = 0x80;

        let mut cpu = new_cpu(bus);
        cpu.reset();
        cpu.step();

        assert!(cpu.halted, "opcode ${opcode:02X}");
        assert_eq!(cpu.sp, 0xFD);
    }
}
