//! Best-effort workload parsing.
//!
//! The format is a whitespace-delimited token stream: the resource count,
//! the capacities, then each process as `pid arrival priority` followed by
//! instructions until `END`. The outer `END` closes the process list.
//! Unknown instruction tokens are skipped; a missing or malformed numeric
//! field truncates the rest of the record it sits in, a failed capacity
//! read the whole input. Nothing here panics on bad input.

use std::io::{self, Read};

use simulator::{Instruction, Process, ResourceId, Tick, Workload};

/// Reads and parses a whole workload from `reader`
pub fn parse_workload<R: Read>(mut reader: R) -> io::Result<Workload> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(parse_text(&text))
}

pub fn parse_text(text: &str) -> Workload {
    let mut tokens = text.split_whitespace();
    let mut workload = Workload::default();

    let Some(m) = tokens.next().and_then(|t| t.parse::<usize>().ok()) else {
        return workload;
    };
    for _ in 0..m {
        // A failed capacity read abandons the rest of the input
        let Some(capacity) = tokens.next().and_then(|t| t.parse::<u32>().ok()) else {
            return workload;
        };
        workload.capacities.push(capacity);
    }

    while let Some(token) = tokens.next() {
        if token == "END" {
            break;
        }
        let pid = token;
        let Some(arrival) = tokens.next().and_then(|t| t.parse::<Tick>().ok()) else {
            break;
        };
        let Some(priority) = tokens.next().and_then(|t| t.parse::<u32>().ok()) else {
            break;
        };
        let program = parse_program(&mut tokens);
        workload
            .processes
            .push(Process::new(pid, arrival, priority, program));
    }

    workload
}

fn parse_program<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Vec<Instruction> {
    let mut program = Vec::new();
    while let Some(op) = tokens.next() {
        if op == "END" {
            break;
        }
        match op {
            "CPU" => {
                let Some(duration) = next_number(tokens) else {
                    return program;
                };
                program.push(Instruction::Cpu { duration });
            }
            "IO" => {
                let Some(duration) = next_number(tokens) else {
                    return program;
                };
                program.push(Instruction::Io { duration });
            }
            _ => {
                // The resource id rides on the token, e.g. `REQ2 3`
                if let Some(resource) = suffixed_id(op, "REQ") {
                    let Some(count) = next_number(tokens) else {
                        return program;
                    };
                    program.push(Instruction::Request { resource, count });
                } else if let Some(resource) = suffixed_id(op, "REL") {
                    let Some(count) = next_number(tokens) else {
                        return program;
                    };
                    program.push(Instruction::Release { resource, count });
                }
                // Anything else is skipped, argument not consumed
            }
        }
    }
    program
}

fn suffixed_id(op: &str, prefix: &str) -> Option<ResourceId> {
    op.strip_prefix(prefix)
        .and_then(|rest| rest.parse::<u32>().ok())
        .map(ResourceId::new)
}

fn next_number<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<u32> {
    tokens.next().and_then(|t| t.parse::<u32>().ok())
}
