/*
 * SPDX-FileCopyrightText: Copyright (c) 2021-2023 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

// use std::fmt::Write;
use std::str::FromStr;

use ::rpc::errors::RpcDataConversionError;
use carbide_uuid::machine::{MachineId, MachineIdSource, MachineType};
use sha2::{Digest, Sha256};

use crate::hardware_info::HardwareInfo;

/// Generates a temporary Machine ID for a host from the hardware fingerprint
/// of the attached DPU
///
/// Returns `None` if no sufficient data is available
///
/// Panics of the Machine is not a DPU
pub fn host_id_from_dpu_hardware_info(
    hardware_info: &HardwareInfo,
) -> Result<MachineId, MissingHardwareInfo> {
    assert!(hardware_info.is_dpu(), "Method can only be called on a DPU");

    from_hardware_info_with_type(hardware_info, MachineType::PredictedHost)
}

/// Generates a Machine ID from a hardware fingerprint
///
/// Returns `None` if no sufficient data is available
pub fn from_hardware_info_with_type(
    hardware_info: &HardwareInfo,
    machine_type: MachineType,
) -> Result<MachineId, MissingHardwareInfo> {
    let bytes;
    let source;
    let all_serials;

    if let Some(cert) = &hardware_info.tpm_ek_certificate {
        bytes = cert.as_bytes();
        if bytes.is_empty() {
            return Err(MissingHardwareInfo::TPMCertEmpty);
        }
        source = MachineIdSource::Tpm;
    } else if let Some(dmi_data) = &hardware_info.dmi_data {
        // We need at least 1 valid serial number
        if dmi_data.product_serial.is_empty()
            && dmi_data.board_serial.is_empty()
            && dmi_data.chassis_serial.is_empty()
        {
            return Err(MissingHardwareInfo::Serial);
        }

        all_serials = format!(
            "p{}-b{}-c{}",
            dmi_data.product_serial, dmi_data.board_serial, dmi_data.chassis_serial
        );
        bytes = all_serials.as_bytes();
        source = MachineIdSource::ProductBoardChassisSerial;
    } else {
        return Err(MissingHardwareInfo::All);
    }

    let mut hasher = Sha256::new();
    hasher.update(bytes);

    Ok(MachineId::new(
        source,
        hasher.finalize().into(),
        machine_type,
    ))
}

/// Generates a Machine ID from a hardware fingerprint
///
/// Returns `None` if no sufficient data is available
pub fn from_hardware_info(hardware_info: &HardwareInfo) -> Result<MachineId, MissingHardwareInfo> {
    let machine_type = if hardware_info.is_dpu() {
        MachineType::Dpu
    } else {
        MachineType::Host
    };

    from_hardware_info_with_type(hardware_info, machine_type)
}

#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum MissingHardwareInfo {
    #[error("The TPM certificate has no bytes")]
    TPMCertEmpty,
    #[error("Serial number missing (product, board and chassis)")]
    Serial,
    #[error("TPM and DMI data are both missing")]
    All,
}

/// Converts a RPC MachineId into the internal data format
pub fn try_parse_machine_id(id: &str) -> Result<MachineId, RpcDataConversionError> {
    MachineId::from_str(id).map_err(|_| RpcDataConversionError::InvalidMachineId(id.to_string()))
}
