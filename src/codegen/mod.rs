//! MIPS32 instruction selection, activation records, and calling-convention
//! glue. Grounded on `examples/original_source/src/codegen.py::MIPSCodeManager`
//! in full.

pub mod regalloc;
#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::error::CodegenError;
use crate::symbols::SymbolTable;
use crate::tac::{IndexOperand, Op, Operand, TacProgram};
use crate::types::TypeRegistry;
use regalloc::{RegisterAllocator, FLOAT_SCRATCH, INT_SCRATCH, INT_SCRATCH_2};

/// Bytes `push_all`/`pop_all` reserve for the caller-save set.
const CALLER_SAVE_AREA: i32 = 92;

struct LocalSlot {
    alias: i32,
    size: u32,
}

pub struct CodeGenerator<'a> {
    registry: &'a TypeRegistry,
    root: &'a SymbolTable,
    regs: RegisterAllocator,
    text: String,
    strings: Vec<(String, String)>,
    sp_value: i32,
    locals: HashMap<String, LocalSlot>,
    params_size_stack: Vec<i32>,
    current_params_size: i32,
    current_function: String,
    label_seq: u32,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(registry: &'a TypeRegistry, root: &'a SymbolTable) -> Self {
        CodeGenerator {
            registry,
            root,
            regs: RegisterAllocator::new(),
            text: String::new(),
            strings: Vec::new(),
            sp_value: 0,
            locals: HashMap::new(),
            params_size_stack: Vec::new(),
            current_params_size: 0,
            current_function: String::new(),
            label_seq: 0,
        }
    }

    pub fn generate(&mut self, program: &TacProgram) -> Result<String, CodegenError> {
        for (name, ops) in program.iter() {
            self.generate_function(name, ops)?;
        }
        Ok(self.store_code())
    }

    fn generate_function(&mut self, name: &str, ops: &[Op]) -> Result<(), CodegenError> {
        self.regs.reset();
        self.locals.clear();
        self.sp_value = 0;
        self.current_params_size = 0;
        self.current_function = name.to_string();

        self.text.push_str(&format!("{name}:\n"));
        if name != "main" {
            self.text.push_str("\taddi $sp, $sp, -8\n");
            self.text.push_str("\tsw $ra, 4($sp)\n");
            self.text.push_str("\tsw $fp, 0($sp)\n");
            self.text.push_str("\tmove $fp, $sp\n");
        }

        for op in ops {
            self.select(op)?;
        }

        if name == "main" {
            self.text.push_str("\tli $v0, 10\n\tsyscall\n");
        }

        Ok(())
    }

    fn addr(&self, alias: i32, size: u32) -> String {
        format!("{}($sp)", self.sp_value - alias - size as i32)
    }

    fn select(&mut self, op: &Op) -> Result<(), CodegenError> {
        match op {
            Op::Declare { name, size, .. } => {
                // Matches `generate_declare` exactly: alias is the current
                // (pre-increment) `sp_value`, and the stack actually moves.
                let alias = self.sp_value;
                self.sp_value += *size as i32;
                self.locals.insert(name.clone(), LocalSlot { alias, size: *size });
                self.text.push_str(&format!("\taddi $sp, $sp, -{size}\n"));
            }
            Op::Clear { name } => {
                // `generate_clear` restores the stack pointer but does not
                // decrement `sp_value` — preserved as-is (see DESIGN.md).
                if let Some(slot) = self.locals.remove(name) {
                    self.text.push_str(&format!("\taddi $sp, $sp, {}\n", slot.size));
                }
            }
            Op::Assign { dst, src } => self.emit_assign(dst, src)?,
            Op::BinOp { dst, op, a, b } => self.emit_binop(dst, op, a, b)?,
            Op::Unary { dst, op, a } => self.emit_unary(dst, op, a)?,
            Op::Label { name } => self.text.push_str(&format!("{name}:\n")),
            Op::Jump { label } => self.text.push_str(&format!("\tj {label}\n")),
            Op::JumpNz { t, label } => {
                let reg = self.operand_into_reg(t)?;
                self.text.push_str(&format!("\tbnez {reg}, {label}\n"));
            }
            Op::Alloc { dst, ty } => {
                let d = self.dest_reg(dst)?;
                self.text.push_str(&format!("\tli $a0, {}\n\tli $v0, 9\n\tsyscall\n\tmove {d}, $v0\n", ty.size));
            }
            Op::AllocArray { dst, elem_ty, n } => {
                let d = self.dest_reg(dst)?;
                let bytes = elem_ty.size * n;
                self.text.push_str(&format!("\tli $a0, {bytes}\n\tli $v0, 9\n\tsyscall\n\tmove {d}, $v0\n"));
            }
            Op::Set { obj, offset, src } => {
                let obj_reg = self.operand_into_reg(obj)?;
                let src_reg = self.operand_into_reg(src)?;
                let store = if src_reg.starts_with("$f") { "swc1" } else { "sw" };
                self.text.push_str(&format!("\t{store} {src_reg}, {offset}({obj_reg})\n"));
            }
            Op::Get { dst, obj, offset } => {
                let obj_reg = self.operand_into_reg(obj)?;
                let d = self.dest_reg(dst)?;
                let load = if d.starts_with("$f") { "lwc1" } else { "lw" };
                self.text.push_str(&format!("\t{load} {d}, {offset}({obj_reg})\n"));
            }
            Op::SetIndex { arr, index, src } => self.emit_index_store(arr, index, src)?,
            Op::GetIndex { dst, index, arr } => self.emit_index_load(dst, index, arr)?,
            Op::GetParams { params } => {
                // Parameters live below $fp; aliases are assigned by
                // walking the list in reverse and accumulating the running
                // size, `alias = -(total + 8)`, matching the source's
                // `generate_get_params` exactly (the last-declared param
                // sits nearest the frame, the first-declared farthest).
                let mut total = 0i32;
                for (name, ty) in params.iter().rev() {
                    total += ty.size as i32;
                    self.locals.insert(
                        name.clone(),
                        LocalSlot {
                            alias: -(total + 8),
                            size: ty.size,
                        },
                    );
                }
            }
            Op::FunctionCallStart => {
                self.text.push_str("\tjal push_all\n");
                self.sp_value += CALLER_SAVE_AREA;
                self.params_size_stack.push(self.current_params_size);
                self.current_params_size = 0;
            }
            Op::SetParam { t, ty } => {
                let reg = self.operand_into_reg(t)?;
                let store = if reg.starts_with("$f") { "swc1" } else { "sw" };
                self.text.push_str(&format!(
                    "\taddi $sp, $sp, -{0}\n\t{store} {reg}, 0($sp)\n",
                    ty.size
                ));
                self.sp_value += ty.size as i32;
                self.current_params_size += ty.size as i32;
            }
            Op::Call { dst, name } => {
                self.text.push_str(&format!("\tjal {name}\n"));
                self.text.push_str(&format!("\taddi $sp, $sp, {}\n", self.current_params_size));
                self.sp_value -= self.current_params_size;
                self.text.push_str("\tjal pop_all\n");
                self.sp_value -= CALLER_SAVE_AREA;
                let d = self.dest_reg(dst)?;
                let is_float_return = d.starts_with("$f");
                if is_float_return {
                    self.text.push_str(&format!("\tmov.s {d}, $f0\n"));
                } else {
                    self.text.push_str(&format!("\tmove {d}, $v0\n"));
                }
            }
            Op::FunctionCallEnd => {
                self.current_params_size = self.params_size_stack.pop().unwrap_or(0);
            }
            Op::Return { value } => {
                if let Some(v) = value {
                    let reg = self.operand_into_reg(v)?;
                    if reg.starts_with("$f") {
                        self.text.push_str(&format!("\tmov.s $f0, {reg}\n"));
                    } else {
                        self.text.push_str(&format!("\tmove $v0, {reg}\n"));
                    }
                }
                if self.current_function != "main" {
                    self.text.push_str("\tlw $ra, 4($fp)\n");
                    self.text.push_str("\tmove $sp, $fp\n");
                    self.text.push_str("\tlw $fp, 0($fp)\n");
                    self.text.push_str("\taddi $sp, $sp, 8\n");
                    self.text.push_str("\tjr $ra\n");
                }
            }
        }
        Ok(())
    }

    // ---- operand materialization ---------------------------------------

    fn dest_reg(&mut self, operand: &Operand) -> Result<&'static str, CodegenError> {
        match operand {
            Operand::Temp(t) => Ok(self.regs.get_register(t)),
            other => Err(CodegenError::UnknownTemporary(format!("{other:?}"))),
        }
    }

    /// Loads `operand` into a register, allocating one for a temp or
    /// emitting the literal-materialization / stack-load sequence for
    /// everything else.
    fn operand_into_reg(&mut self, operand: &Operand) -> Result<&'static str, CodegenError> {
        match operand {
            Operand::Temp(t) => Ok(self.regs.get_register(t)),
            Operand::Var(name) => {
                let slot = self
                    .locals
                    .get(name)
                    .map(|s| (s.alias, s.size))
                    .ok_or_else(|| CodegenError::UnknownTemporary(name.clone()))?;
                let reg = self.regs.get_register(&format!("t_{name}"));
                let addr = self.addr(slot.0, slot.1);
                let load = if reg.starts_with("$f") { "lwc1" } else { "lw" };
                self.text.push_str(&format!("\t{load} {reg}, {addr}\n"));
                Ok(reg)
            }
            Operand::Number(n) => {
                let reg = self.regs.get_register("f_lit");
                self.text.push_str(&format!("\tli.s {reg}, {n}\n"));
                Ok(reg)
            }
            Operand::Bool(b) => {
                let reg = self.regs.get_register("t_lit");
                self.text.push_str(&format!("\tli {reg}, {}\n", if *b { 1 } else { 0 }));
                Ok(reg)
            }
            Operand::Str(s) => {
                let label = self.intern_string(s);
                let reg = self.regs.get_register("t_lit");
                self.text.push_str(&format!("\tla {reg}, {label}\n"));
                Ok(reg)
            }
        }
    }

    fn intern_string(&mut self, value: &str) -> String {
        if let Some((label, _)) = self.strings.iter().find(|(_, v)| v == value) {
            return label.clone();
        }
        let label = format!("string_{}", self.strings.len() + 1);
        self.strings.push((label.clone(), value.to_string()));
        label
    }

    fn emit_assign(&mut self, dst: &Operand, src: &Operand) -> Result<(), CodegenError> {
        let src_reg = self.operand_into_reg(src)?;
        match dst {
            Operand::Temp(_) => {
                let d = self.dest_reg(dst)?;
                let mov = if d.starts_with("$f") { "mov.s" } else { "move" };
                self.text.push_str(&format!("\t{mov} {d}, {src_reg}\n"));
            }
            Operand::Var(name) => {
                let slot = self
                    .locals
                    .get(name)
                    .map(|s| (s.alias, s.size))
                    .ok_or_else(|| CodegenError::UnknownTemporary(name.clone()))?;
                let addr = self.addr(slot.0, slot.1);
                let store = if src_reg.starts_with("$f") { "swc1" } else { "sw" };
                self.text.push_str(&format!("\t{store} {src_reg}, {addr}\n"));
            }
            _ => return Err(CodegenError::UnknownTemporary(format!("{dst:?}"))),
        }
        Ok(())
    }

    fn emit_unary(&mut self, dst: &Operand, op: &str, a: &Operand) -> Result<(), CodegenError> {
        let a_reg = self.operand_into_reg(a)?;
        let d = self.dest_reg(dst)?;
        match op {
            "-" => self.text.push_str(&format!("\tneg.s {d}, {a_reg}\n")),
            "+" => self.text.push_str(&format!("\tmov.s {d}, {a_reg}\n")),
            "!" => self.text.push_str(&format!("\txori {d}, {a_reg}, 1\n")),
            other => return Err(CodegenError::UnsupportedOp(other.to_string())),
        }
        Ok(())
    }

    fn emit_binop(&mut self, dst: &Operand, op: &str, a: &Operand, b: &Operand) -> Result<(), CodegenError> {
        let a_reg = self.operand_into_reg(a)?;
        let b_reg = self.operand_into_reg(b)?;
        let d = self.dest_reg(dst)?;

        match op {
            "+" => self.text.push_str(&format!("\tadd.s {d}, {a_reg}, {b_reg}\n")),
            "-" => self.text.push_str(&format!("\tsub.s {d}, {a_reg}, {b_reg}\n")),
            "*" => self.text.push_str(&format!("\tmul.s {d}, {a_reg}, {b_reg}\n")),
            "/" => self.text.push_str(&format!("\tdiv.s {d}, {a_reg}, {b_reg}\n")),
            "&&" => self.text.push_str(&format!("\tand {d}, {a_reg}, {b_reg}\n")),
            "||" => self.text.push_str(&format!("\tor {d}, {a_reg}, {b_reg}\n")),
            "==" | "!=" => self.emit_compare("c.eq.s", d, a_reg, b_reg, op == "!="),
            "<=" => self.emit_compare("c.le.s", d, a_reg, b_reg, false),
            ">=" => self.emit_compare("c.le.s", d, b_reg, a_reg, false),
            "<" => self.emit_compare("c.lt.s", d, a_reg, b_reg, false),
            ">" => self.emit_compare("c.lt.s", d, b_reg, a_reg, false),
            other => return Err(CodegenError::UnsupportedOp(other.to_string())),
        }
        Ok(())
    }

    /// `c.eq.s`/`c.lt.s`/`c.le.s` followed by a branch that materializes
    /// 0/1 into `dst`; `invert` flips the sense for `!=`.
    fn emit_compare(&mut self, cc: &str, dst: &'static str, a: &'static str, b: &'static str, invert: bool) {
        let false_label = self.next_compare_label();
        let end_label = self.next_compare_label();
        self.text.push_str(&format!("\t{cc} {a}, {b}\n"));
        let branch = if invert { "bc1t" } else { "bc1f" };
        self.text.push_str(&format!("\t{branch} {false_label}\n"));
        self.text.push_str(&format!("\tli {dst}, 1\n"));
        self.text.push_str(&format!("\tj {end_label}\n"));
        self.text.push_str(&format!("{false_label}:\n"));
        self.text.push_str(&format!("\tli {dst}, 0\n"));
        self.text.push_str(&format!("{end_label}:\n"));
    }

    fn next_compare_label(&mut self) -> String {
        self.label_seq += 1;
        format!("_cmp{}", self.label_seq)
    }

    fn emit_index_store(&mut self, arr: &Operand, index: &IndexOperand, src: &Operand) -> Result<(), CodegenError> {
        let arr_reg = self.operand_into_reg(arr)?;
        let src_reg = self.operand_into_reg(src)?;
        let store = if src_reg.starts_with("$f") { "swc1" } else { "sw" };
        match index {
            IndexOperand::Literal(i) => {
                self.text.push_str(&format!("\t{store} {src_reg}, {}({arr_reg})\n", i * 4));
            }
            IndexOperand::Temp(t) => {
                let idx_reg = self.regs.get_register(t);
                self.text.push_str(&format!("\tcvt.w.s {FLOAT_SCRATCH}, {idx_reg}\n"));
                self.text.push_str(&format!("\tmfc1 {INT_SCRATCH}, {FLOAT_SCRATCH}\n"));
                self.text.push_str(&format!("\tsll {INT_SCRATCH}, {INT_SCRATCH}, 2\n"));
                self.text.push_str(&format!("\tadd {INT_SCRATCH_2}, {arr_reg}, {INT_SCRATCH}\n"));
                self.text.push_str(&format!("\t{store} {src_reg}, 0({INT_SCRATCH_2})\n"));
            }
        }
        Ok(())
    }

    fn emit_index_load(&mut self, dst: &Operand, index: &IndexOperand, arr: &Operand) -> Result<(), CodegenError> {
        let arr_reg = self.operand_into_reg(arr)?;
        let d = self.dest_reg(dst)?;
        let load = if d.starts_with("$f") { "lwc1" } else { "lw" };
        match index {
            IndexOperand::Literal(i) => {
                self.text.push_str(&format!("\t{load} {d}, {}({arr_reg})\n", i * 4));
            }
            IndexOperand::Temp(t) => {
                let idx_reg = self.regs.get_register(t);
                self.text.push_str(&format!("\tcvt.w.s {FLOAT_SCRATCH}, {idx_reg}\n"));
                self.text.push_str(&format!("\tmfc1 {INT_SCRATCH}, {FLOAT_SCRATCH}\n"));
                self.text.push_str(&format!("\tsll {INT_SCRATCH}, {INT_SCRATCH}, 2\n"));
                self.text.push_str(&format!("\tadd {INT_SCRATCH_2}, {arr_reg}, {INT_SCRATCH}\n"));
                self.text.push_str(&format!("\t{load} {d}, 0({INT_SCRATCH_2})\n"));
            }
        }
        Ok(())
    }

    /// `store_code`: data section (prelude + collected literals), then
    /// `.text` with every function block, then the runtime prelude
    /// appended verbatim at the very end.
    fn store_code(&self) -> String {
        let mut out = String::new();
        out.push_str(crate::runtime::DATA_PRELUDE);
        for (label, value) in &self.strings {
            out.push_str(&format!("\t\t{label}:\t\t   .asciiz    \"{value}\"\n"));
        }
        out.push_str("\n.text\n");
        out.push_str(&self.text);
        out.push('\n');
        out.push_str(crate::runtime::CODE_PRELUDE);
        out
    }
}
