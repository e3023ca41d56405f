//! Contract bindings of the pool factory, router, pools and their tokens.
//!
//! Only the functions a liquidity cycle touches are bound. Router writes are encoded by hand so
//! the exact same calldata is used for estimation and submission.

use alloy::{
    primitives::Bytes,
    sol,
    sol_types::SolCall,
};
use lp_cycler_common::models::ContractCall;

use crate::{biguint_to_u256, errors::RPCError};

sol! {
    #[sol(rpc)]
    interface IPoolFactory {
        function getPool(address tokenA, address tokenB) external view returns (address pool);
    }

    #[sol(rpc)]
    interface IRouter {
        struct TokenInput {
            address token;
            uint256 amount;
        }

        function addLiquidity2(
            address pool,
            TokenInput[] calldata inputs,
            bytes calldata data,
            uint256 minLiquidity,
            address callback,
            bytes calldata callbackData
        ) external;

        function burnLiquidity(
            address pool,
            uint256 liquidity,
            bytes calldata data,
            uint256[] calldata minAmounts,
            address callback,
            bytes calldata callbackData
        ) external;
    }

    #[sol(rpc)]
    interface IPool {
        function getReserves() external view returns (uint256 reserve0, uint256 reserve1);
        function token0() external view returns (address);
        function totalSupply() external view returns (uint256);
    }

    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function symbol() external view returns (string);
    }
}

/// ABI encoded calldata of a write, with every amount checked to fit `uint256`.
pub fn encode_call(call: &ContractCall) -> Result<Bytes, RPCError> {
    let data = match call {
        ContractCall::Approve { spender, amount, .. } => {
            IERC20::approveCall { spender: *spender, amount: biguint_to_u256(amount)? }.abi_encode()
        }
        ContractCall::AddLiquidity { request, .. } => {
            let inputs = request
                .inputs
                .iter()
                .map(|input| {
                    Ok(IRouter::TokenInput {
                        token: input.token,
                        amount: biguint_to_u256(&input.amount)?,
                    })
                })
                .collect::<Result<Vec<_>, RPCError>>()?;
            IRouter::addLiquidity2Call {
                pool: request.pool,
                inputs,
                data: request.data.clone(),
                minLiquidity: biguint_to_u256(&request.min_liquidity)?,
                callback: request.callback,
                callbackData: request.callback_data.clone(),
            }
            .abi_encode()
        }
        ContractCall::BurnLiquidity { request, .. } => IRouter::burnLiquidityCall {
            pool: request.pool,
            liquidity: biguint_to_u256(&request.liquidity)?,
            data: request.data.clone(),
            minAmounts: request
                .min_amounts
                .iter()
                .map(biguint_to_u256)
                .collect::<Result<Vec<_>, _>>()?,
            callback: request.callback,
            callbackData: request.callback_data.clone(),
        }
        .abi_encode(),
    };
    Ok(data.into())
}
